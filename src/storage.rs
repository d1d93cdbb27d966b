//! Durable session storage.
//!
//! Two files under one directory: `user` (JSON) and `token` (raw string).
//! Values are replaced whole on every write, never merged, and reads go to
//! disk every time so a fresh process sees the persisted session before any
//! action has been dispatched. Absence of either key means logged out.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::model::User;

const USER_KEY: &str = "user";
const TOKEN_KEY: &str = "token";

#[derive(Clone, Debug)]
pub struct SessionStorage {
    dir: PathBuf,
}

impl SessionStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The stored user, if present and well-formed.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(error) => {
                tracing::warn!(%error, "stored user is not valid JSON");
                None
            }
        }
    }

    /// The stored access token, if present.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(json) => self.write(USER_KEY, &json),
            Err(error) => tracing::warn!(%error, "user serialization failed"),
        }
    }

    pub fn set_token(&self, token: &str) {
        self.write(TOKEN_KEY, token);
    }

    /// Removes both keys, logging out whoever was stored.
    pub fn clear(&self) {
        self.remove(USER_KEY);
        self.remove(TOKEN_KEY);
    }

    fn read(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.dir.join(key)) {
            Ok(value) => Some(value),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => {
                tracing::warn!(key, %error, "session storage read failed");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(error) = fs::create_dir_all(&self.dir) {
            tracing::warn!(%error, "session storage directory create failed");
            return;
        }
        if let Err(error) = fs::write(self.dir.join(key), value) {
            tracing::warn!(key, %error, "session storage write failed");
        }
    }

    fn remove(&self, key: &str) {
        match fs::remove_file(self.dir.join(key)) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => tracing::warn!(key, %error, "session storage remove failed"),
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
