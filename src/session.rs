use log::{info, warn};

use crate::auth::Token;
use crate::error::{PipemonError, Result};
use crate::model::Pipeline;
use crate::providers::{DateWindow, FetchSettings, GitLabProvider};
use crate::store::{CredentialBackend, CredentialStore};

/// Pipelines gathered from every stored repository.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub pipelines: Vec<Pipeline>,
    /// Repositories whose fetch failed, with the error that aborted them
    pub failures: Vec<(String, PipemonError)>,
}

/// Ties fetching to the credential store: a repository is remembered only
/// after its pipelines were fetched successfully.
pub struct Session<B: CredentialBackend> {
    store: CredentialStore<B>,
    api_url: Option<String>,
    settings: FetchSettings,
}

impl<B: CredentialBackend> Session<B> {
    pub fn new(
        store: CredentialStore<B>,
        api_url: Option<String>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            store,
            api_url,
            settings,
        }
    }

    pub fn store(&self) -> &CredentialStore<B> {
        &self.store
    }

    /// Fetches one repository and remembers its credential on success.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRepositoryUrl` before any request for a malformed URL,
    /// or the first upstream failure. Nothing is remembered in either case.
    pub async fn fetch(
        &mut self,
        repository_url: &str,
        token: Token,
        window: &DateWindow,
    ) -> Result<Vec<Pipeline>> {
        let repository_url = repository_url.trim();
        let pipelines = self.collect(repository_url, token.clone(), window).await?;
        self.store.remember(repository_url, token)?;
        Ok(pipelines)
    }

    /// Fetches every stored repository in order.
    ///
    /// A failing repository is recorded in [`BatchOutcome::failures`] and the
    /// remaining repositories are still fetched.
    pub async fn fetch_all(&self, window: &DateWindow) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for credential in self.store.list() {
            match self
                .collect(&credential.url, credential.token.clone(), window)
                .await
            {
                Ok(pipelines) => outcome.pipelines.extend(pipelines),
                Err(e) => {
                    warn!("Skipping {}: {e}", credential.url);
                    outcome.failures.push((credential.url.clone(), e));
                }
            }
        }

        info!(
            "Fetched {} pipelines from {} repositories ({} failed)",
            outcome.pipelines.len(),
            self.store.list().len(),
            outcome.failures.len()
        );

        outcome
    }

    async fn collect(
        &self,
        repository_url: &str,
        token: Token,
        window: &DateWindow,
    ) -> Result<Vec<Pipeline>> {
        let provider =
            GitLabProvider::new(repository_url, token, self.api_url.as_deref(), self.settings)?;
        provider.collect_pipelines(window).await
    }
}
