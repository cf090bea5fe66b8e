//! Stored Mastodon credentials
//!
//! Registering the app and running the OAuth flow happen elsewhere; this
//! module only loads what those steps left on disk. Both files are TOML:
//!
//! ```toml
//! # clientcred.secret
//! client_id = "..."
//! client_secret = "..."
//!
//! # usercred.secret
//! access_token = "..."
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{BotError, Result};

#[derive(Clone, Deserialize)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Deserialize)]
pub struct UserCredentials {
    pub access_token: String,
}

/// Everything needed to act as the bot account
#[derive(Clone)]
pub struct Credentials {
    pub app: AppCredentials,
    pub user: UserCredentials,
}

// Keep secrets out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.app.client_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn load(app_path: &Path, user_path: &Path) -> Result<Self> {
        let app: AppCredentials = read_toml(app_path)?;
        let user: UserCredentials = read_toml(user_path)?;

        if user.access_token.trim().is_empty() {
            return Err(BotError::Credentials {
                path: user_path.to_path_buf(),
                reason: "access_token is empty".into(),
            });
        }

        Ok(Self { app, user })
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| BotError::Credentials {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| BotError::Credentials {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_credentials() {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("clientcred.secret");
        let user = dir.path().join("usercred.secret");
        std::fs::write(&app, "client_id = \"abc\"\nclient_secret = \"shh\"\n").unwrap();
        std::fs::write(&user, "access_token = \"tok\"\n").unwrap();

        let creds = Credentials::load(&app, &user).unwrap();
        assert_eq!(creds.app.client_id, "abc");
        assert_eq!(creds.user.access_token, "tok");

        let debug = format!("{:?}", creds);
        assert!(!debug.contains("shh"));
        assert!(!debug.contains("tok"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("clientcred.secret");
        let user = dir.path().join("missing.secret");
        std::fs::write(&app, "client_id = \"abc\"\nclient_secret = \"shh\"\n").unwrap();

        let err = Credentials::load(&app, &user).unwrap_err();
        assert!(err.to_string().contains("missing.secret"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let dir = TempDir::new().unwrap();
        let app = dir.path().join("app");
        let user = dir.path().join("user");
        std::fs::write(&app, "client_id = \"abc\"\nclient_secret = \"shh\"\n").unwrap();
        std::fs::write(&user, "access_token = \"  \"\n").unwrap();

        assert!(matches!(
            Credentials::load(&app, &user),
            Err(BotError::Credentials { .. })
        ));
    }
}
