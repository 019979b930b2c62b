use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: String,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

/// Who is talking to the backend. Created once at startup from the persisted
/// credentials and handed to whatever needs it.
#[derive(Debug, Clone)]
pub struct AuthContext {
    path: PathBuf,
    credentials: Option<Credentials>,
}

impl AuthContext {
    /// Reads the credentials file; a missing file means logged out.
    pub fn init<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        let credentials = match fs::read_to_string(&path) {
            Ok(raw) => Some(
                serde_json::from_str::<Credentials>(&raw)
                    .map_err(|err| Error::Credentials(format!("{}: {err}", path.display())))?,
            ),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };

        debug!(
            "Loaded credentials from {} (logged in: {})",
            path.display(),
            credentials.is_some()
        );

        Ok(Self { path, credentials })
    }

    /// Logged-out context bound to `path` without reading it, so a broken
    /// file can still be replaced by `login` or removed by `logout`.
    #[must_use]
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            credentials: None,
        }
    }

    /// Context that is never written to disk, for embedding and tests.
    #[must_use]
    pub fn in_memory(credentials: Credentials) -> Self {
        Self {
            path: PathBuf::new(),
            credentials: Some(credentials),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            path: PathBuf::new(),
            credentials: None,
        }
    }

    pub fn login(&mut self, credentials: Credentials) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&credentials)?)?;
        info!("Logged in as {}", credentials.user.username);
        self.credentials = Some(credentials);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        match self.credentials.take() {
            Some(credentials) => info!("Logged out {}", credentials.user.username),
            None => info!("Removed {}", self.path.display()),
        }
        Ok(())
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::is_admin)
    }

    pub fn require_admin(&self) -> Result<()> {
        match self.user() {
            None => Err(Error::NotLoggedIn),
            Some(user) if user.is_admin() => Ok(()),
            Some(_) => Err(Error::Forbidden),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
