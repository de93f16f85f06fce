//! Explicit authentication session.
//!
//! A [`Session`] is a plain value: `login` and `logout` return the next
//! state and never touch storage. Persisting it is a separate call on a
//! [`SessionStore`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn login(self, token: impl Into<String>) -> CoreResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(CoreError::InvalidArgument("token must not be empty".into()));
        }
        Ok(Self { token: Some(token) })
    }

    pub fn logout(self) -> Self {
        Self::anonymous()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Gate for mutating operations.
    pub fn require(&self) -> CoreResult<&str> {
        self.token().ok_or(CoreError::Unauthorized)
    }
}

pub trait SessionStore {
    fn load(&self) -> CoreResult<Session>;
    fn save(&self, session: &Session) -> CoreResult<()>;
}

/// Keeps the token in a single file; an anonymous session removes it.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> CoreResult<Session> {
        if !self.path.exists() {
            return Ok(Session::anonymous());
        }
        let contents = fs::read_to_string(&self.path)?;
        let token = contents.trim();
        if token.is_empty() {
            return Ok(Session::anonymous());
        }
        Session::anonymous().login(token)
    }

    fn save(&self, session: &Session) -> CoreResult<()> {
        match session.token() {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(&self.path, token)?;
                debug!(path = %self.path.display(), "session saved");
            }
            None => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    debug!(path = %self.path.display(), "session cleared");
                }
            }
        }
        Ok(())
    }
}
