mod cache;
mod credential;
mod flow;
mod prompt;

pub use cache::{CACHE_FILE_NAME, TokenCache};
pub use credential::Credential;
pub use flow::{OAuthFlow, STATE_TOKEN};
pub use prompt::{LoopbackReceiver, OOB_REDIRECT_URI, TerminalPrompt};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, instrument};
use url::Url;

/// The OAuth2 provider: builds the consent URL and trades codes for tokens.
#[async_trait]
pub trait Authorizer: Send + Sync {
    fn authorize_url(&self) -> Url;

    async fn exchange_code(&self, code: String) -> Result<Credential>;
}

/// Supplies the authorization code once the operator has consented.
///
/// This is where acquisition suspends. Headless hosts substitute their own
/// implementation instead of the terminal prompt.
#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Redirect URI the provider should send the code to.
    fn redirect_uri(&self) -> String;

    async fn authorization_code(&self, auth_url: &Url) -> Result<String>;
}

#[async_trait]
impl<S> CodeSource for Box<S>
where
    S: CodeSource + ?Sized,
{
    fn redirect_uri(&self) -> String {
        (**self).redirect_uri()
    }

    async fn authorization_code(&self, auth_url: &Url) -> Result<String> {
        (**self).authorization_code(auth_url).await
    }
}

/// Obtains a credential from the cache, or interactively when the cache
/// cannot supply one.
pub struct CredentialManager<A, S> {
    cache: TokenCache,
    authorizer: A,
    code_source: S,
}

impl<A, S> CredentialManager<A, S>
where
    A: Authorizer,
    S: CodeSource,
{
    pub fn new(cache: TokenCache, authorizer: A, code_source: S) -> Self {
        Self {
            cache,
            authorizer,
            code_source,
        }
    }

    /// Return a credential, authorizing interactively on a cache miss.
    ///
    /// A cached credential is returned as-is, without checking its expiry.
    /// Failures after the cache miss (code entry, exchange, persisting) are
    /// returned to the caller; nothing is retried.
    #[instrument(name = "Acquiring credential", skip_all)]
    pub async fn acquire(&self) -> Result<Credential> {
        self.cache.ensure_dir()?;

        match self.cache.load() {
            Ok(Some(credential)) => {
                debug!(path = ?self.cache.path(), "Using cached credential");
                return Ok(credential);
            }
            Ok(None) => debug!("No cached credential found, authorizing..."),
            Err(e) => debug!("Cached credential unusable ({}), authorizing...", e),
        }

        let credential = self.authorize().await?;
        self.cache.save(&credential)?;

        Ok(credential)
    }

    async fn authorize(&self) -> Result<Credential> {
        let auth_url = self.authorizer.authorize_url();
        let code = self.code_source.authorization_code(&auth_url).await?;
        let credential = self.authorizer.exchange_code(code).await?;
        info!("Authorization complete");

        Ok(credential)
    }
}

/// Clear the cached credential in `cache_dir`
#[instrument(name = "Clearing cached credential", skip_all)]
pub fn clear_tokens(cache_dir: &Path) -> Result<()> {
    TokenCache::new(cache_dir).clear()
}
