//! Follow-back reconciliation for auto-follow mode

use tracing::{info, warn};

use super::FollowingSet;
use crate::error::Result;
use crate::model::{Account, AccountId};
use crate::platform::Platform;

/// Page through our followers and follow back anyone we don't follow yet.
///
/// Newly followed accounts are appended to `following`, and the extended
/// list of everything we follow is returned. A failed follow request is
/// logged and skipped; a failed page fetch aborts.
pub async fn reconcile_followers(
    platform: &dyn Platform,
    me: &AccountId,
    following: &mut FollowingSet,
) -> Result<Vec<Account>> {
    let mut added = 0usize;
    let mut cursor = None;

    loop {
        let page = platform.fetch_followers(me, cursor.as_ref()).await?;

        for follower in page.items {
            if following.contains(&follower.id) {
                continue;
            }
            following.insert(follower.clone());

            if let Err(e) = platform.follow(&follower.id).await {
                warn!(account = %follower.acct, error = %e, "Failed to follow back");
            } else {
                info!(account = %follower.acct, "Followed back");
            }
            added += 1;
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!(added, following = following.len(), "Follower reconciliation complete");
    Ok(following.snapshot())
}
