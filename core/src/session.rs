use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Remembers which email registered on this machine.
///
/// The email only tells the client whom to look up; it is not a credential.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the session file as `session` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("session"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_email(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let email = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        let email = email.trim();
        Ok((!email.is_empty()).then(|| email.to_string()))
    }

    pub fn set_email(&self, email: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, email.trim())
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }
        debug!(path = %self.path.display(), "session stored");
        Ok(())
    }

    /// Forget the stored email. Clearing an empty session is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file: {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(dir.path());
        assert_eq!(store.get_email().unwrap(), None);
    }

    #[test]
    fn test_set_get_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(dir.path());
        store.set_email("  ada@example.com\n").unwrap();
        assert_eq!(store.get_email().unwrap().as_deref(), Some("ada@example.com"));

        store.clear().unwrap();
        assert_eq!(store.get_email().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_set_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session"));
        store.set_email("ada@example.com").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_blank_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::in_dir(dir.path());
        std::fs::write(store.path(), "   \n").unwrap();
        assert_eq!(store.get_email().unwrap(), None);
    }
}
