use trix::auth::{CodeSource, CredentialManager, OAuthFlow, TokenCache, clear_tokens};
use trix::config::ClientConfig;
use trix::{Result, Settings};
use tracing::info;

pub async fn execute(
    settings: &Settings,
    code_source: Box<dyn CodeSource>,
    reset: bool,
) -> Result<()> {
    if reset {
        clear_tokens(&settings.cache_dir)?;
    }

    let config = ClientConfig::load(&settings.secret_file, &settings.scopes)?;
    let flow = OAuthFlow::new(&config, &code_source.redirect_uri())?;
    let cache = TokenCache::new(&settings.cache_dir);
    let path = cache.path().to_path_buf();

    let credential = CredentialManager::new(cache, flow, code_source)
        .acquire()
        .await?;

    info!(
        path = ?path,
        expired = credential.is_expired(),
        "Google Sheets credential available"
    );

    Ok(())
}
