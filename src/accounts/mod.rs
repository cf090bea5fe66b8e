//! Account-set bootstrap
//!
//! Handles:
//! - Paginated fetch of the accounts we follow
//! - Optional follow-back reconciliation against our followers

pub mod following;
pub mod reconcile;

pub use following::{build_following_set, FollowingSet};
pub use reconcile::reconcile_followers;
