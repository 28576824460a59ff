use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::auth::Token;
use crate::error::{PipemonError, Result};
use crate::model::RepositoryCredential;

/// Persistence seam for the credential store.
pub trait CredentialBackend {
    fn load(&self) -> Result<Vec<RepositoryCredential>>;
    fn save(&mut self, credentials: &[RepositoryCredential]) -> Result<()>;
}

/// Keeps credentials in memory only.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    credentials: Vec<RepositoryCredential>,
}

#[cfg(test)]
impl CredentialBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<RepositoryCredential>> {
        Ok(self.credentials.clone())
    }

    fn save(&mut self, credentials: &[RepositoryCredential]) -> Result<()> {
        self.credentials = credentials.to_vec();
        Ok(())
    }
}

/// JSON file backend.
///
/// Defaults to a platform-specific data directory:
/// - Linux: `~/.local/share/pipemon/repositories.json`
/// - macOS: `~/Library/Application Support/pipemon/repositories.json`
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined for the platform.
    pub fn default_location() -> Result<Self> {
        let path = dirs::data_dir()
            .ok_or_else(|| PipemonError::Store("No data directory found".into()))?
            .join("pipemon")
            .join("repositories.json");
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialBackend for FileBackend {
    fn load(&self) -> Result<Vec<RepositoryCredential>> {
        if !self.path.exists() {
            debug!("No credential store at {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(credentials) => Ok(credentials),
            Err(e) => {
                warn!(
                    "Ignoring unreadable credential store {}: {e}",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, credentials: &[RepositoryCredential]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, content)?;
        debug!(
            "Saved {} repositories to {}",
            credentials.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Recently analyzed repositories, keyed by URL.
///
/// Entries are never evicted. Re-submitting a URL replaces its token in place.
pub struct CredentialStore<B: CredentialBackend> {
    backend: B,
    credentials: Vec<RepositoryCredential>,
}

impl<B: CredentialBackend> CredentialStore<B> {
    /// Opens the store, loading any existing entries from the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn open(backend: B) -> Result<Self> {
        let credentials = backend.load()?;
        debug!("Loaded {} stored repositories", credentials.len());
        Ok(Self {
            backend,
            credentials,
        })
    }

    pub fn list(&self) -> &[RepositoryCredential] {
        &self.credentials
    }

    pub fn get(&self, url: &str) -> Option<&RepositoryCredential> {
        self.credentials.iter().find(|credential| credential.url == url)
    }

    /// Inserts or updates the entry for `url` and persists the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist.
    pub fn remember(&mut self, url: &str, token: Token) -> Result<()> {
        match self
            .credentials
            .iter_mut()
            .find(|credential| credential.url == url)
        {
            Some(existing) => existing.token = token,
            None => {
                info!("Remembering repository: {url}");
                self.credentials.push(RepositoryCredential {
                    url: url.to_string(),
                    token,
                });
            }
        }

        self.backend.save(&self.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remember_appends_new_urls_in_order() {
        let mut store = CredentialStore::open(MemoryBackend::default()).unwrap();
        store.remember("https://gitlab.com/a/one", Token::from("t1")).unwrap();
        store.remember("https://gitlab.com/a/two", Token::from("t2")).unwrap();

        let urls: Vec<_> = store.list().iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["https://gitlab.com/a/one", "https://gitlab.com/a/two"]);
    }

    #[test]
    fn test_remember_is_last_write_wins() {
        let mut store = CredentialStore::open(MemoryBackend::default()).unwrap();
        store.remember("https://gitlab.com/a/one", Token::from("old")).unwrap();
        store.remember("https://gitlab.com/a/two", Token::from("t2")).unwrap();
        store.remember("https://gitlab.com/a/one", Token::from("new")).unwrap();

        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[0].url, "https://gitlab.com/a/one");
        assert_eq!(
            store.get("https://gitlab.com/a/one").map(|c| c.token.as_str()),
            Some("new")
        );
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("repositories.json");

        let mut store = CredentialStore::open(FileBackend::new(&path)).unwrap();
        store.remember("https://gitlab.com/g/p.git", Token::from("glpat-x")).unwrap();
        assert!(path.exists());

        let reloaded = CredentialStore::open(FileBackend::new(&path)).unwrap();
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.list()[0].url, "https://gitlab.com/g/p.git");
        assert_eq!(reloaded.list()[0].token.as_str(), "glpat-x");
    }

    #[test]
    fn test_file_backend_missing_or_corrupt_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("repositories.json");

        let backend = FileBackend::new(&path);
        assert!(backend.load().unwrap().is_empty());

        fs::write(&path, "not json").unwrap();
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_stored_format_is_url_token_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("repositories.json");

        let mut store = CredentialStore::open(FileBackend::new(&path)).unwrap();
        store.remember("https://gitlab.com/g/p", Token::from("abc")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([{ "url": "https://gitlab.com/g/p", "token": "abc" }])
        );
    }
}
