use chrono::{DateTime, TimeDelta, Utc};
use oauth2::TokenResponse;
use oauth2::basic::{BasicTokenResponse, BasicTokenType};
use serde::{Deserialize, Serialize};

/// Access credential as persisted in the token cache.
///
/// The JSON shape matches caches written by earlier quickstart tooling, so an
/// existing `.credentials` directory keeps working.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Whether the access token has passed its expiry. Credentials without an
    /// expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= Utc::now())
    }
}

impl From<BasicTokenResponse> for Credential {
    fn from(response: BasicTokenResponse) -> Self {
        let token_type = match response.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        };

        let expiry = response
            .expires_in()
            .and_then(|d| TimeDelta::from_std(d).ok())
            .map(|d| Utc::now() + d);

        Credential {
            access_token: response.access_token().secret().clone(),
            token_type: Some(token_type),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            expiry,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn mock_credential() -> Credential {
        Credential {
            access_token: "ya29.access".to_string(),
            token_type: Some("Bearer".to_string()),
            refresh_token: Some("1//refresh".to_string()),
            expiry: Some(Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()),
        }
    }
}
