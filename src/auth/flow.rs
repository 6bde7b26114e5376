use crate::auth::Authorizer;
use crate::auth::credential::Credential;
use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, Scope, StandardRevocableToken, TokenUrl,
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
};
use reqwest::redirect::Policy;
use tracing::{debug, instrument};
use url::Url;

/// Anti-forgery state sent with every authorization request.
pub const STATE_TOKEN: &str = "state-token";

// Type alias for the client when Auth and Token URLs are set
type ConfiguredClient = Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

/// Authorization-code flow against the endpoints named in the client secret.
pub struct OAuthFlow {
    client: ConfiguredClient,
    http_client: reqwest::Client,
    scopes: Vec<String>,
}

impl OAuthFlow {
    pub fn new(config: &ClientConfig, redirect_uri: &str) -> Result<Self> {
        let secret = &config.secret;
        let auth_url = AuthUrl::new(secret.auth_uri.clone())
            .map_err(|e| AppError::Config(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(secret.token_uri.clone())
            .map_err(|e| AppError::Config(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| AppError::Config(format!("Invalid redirect URL: {}", e)))?;

        let client = BasicClient::new(ClientId::new(secret.client_id.clone()))
            .set_client_secret(ClientSecret::new(secret.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        // Following redirects from the token endpoint would leak the code
        let http_client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            http_client,
            scopes: config.scopes.clone(),
        })
    }
}

#[async_trait]
impl Authorizer for OAuthFlow {
    fn authorize_url(&self) -> Url {
        let scopes = self
            .scopes
            .iter()
            .map(|s| Scope::new(s.clone()))
            .collect::<Vec<Scope>>();

        let (url, _state) = self
            .client
            .authorize_url(|| CsrfToken::new(STATE_TOKEN.to_string()))
            .add_scopes(scopes)
            .add_extra_param("access_type", "offline")
            .url();

        url
    }

    #[instrument(name = "Exchanging authorization code", skip_all)]
    async fn exchange_code(&self, code: String) -> Result<Credential> {
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Unable to retrieve token from web: {:?}", e)))?;

        debug!("Authorization code exchanged");

        Ok(token_result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_helpers::mock_client_config;

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_authorize_url_requests_offline_access() {
        let flow = OAuthFlow::new(&mock_client_config(), "urn:ietf:wg:oauth:2.0:oob").unwrap();
        let url = flow.authorize_url();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(query_value(&url, "access_type").as_deref(), Some("offline"));
        assert_eq!(query_value(&url, "state").as_deref(), Some(STATE_TOKEN));
        assert_eq!(query_value(&url, "response_type").as_deref(), Some("code"));
        assert_eq!(
            query_value(&url, "client_id").as_deref(),
            Some("1234.apps.googleusercontent.com")
        );
        assert_eq!(
            query_value(&url, "scope").as_deref(),
            Some("https://www.googleapis.com/auth/spreadsheets")
        );
        assert_eq!(
            query_value(&url, "redirect_uri").as_deref(),
            Some("urn:ietf:wg:oauth:2.0:oob")
        );
    }

    #[test]
    fn test_invalid_token_uri_is_config_error() {
        let mut config = mock_client_config();
        config.secret.token_uri = "not a url".to_string();

        let result = OAuthFlow::new(&config, "http://127.0.0.1:8080");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
