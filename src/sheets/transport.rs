use crate::auth::Credential;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use google_sheets4::Sheets;
use google_sheets4::api::{UpdateValuesResponse, ValueRange};
use hyper_rustls::HttpsConnector;
use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use tracing::{debug, instrument};

/// The two remote value operations the facade is built on.
#[async_trait]
pub trait SheetsTransport: Send + Sync {
    async fn values_get(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange>;

    async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: ValueRange,
        value_input_option: &str,
    ) -> Result<UpdateValuesResponse>;
}

/// Sheets API hub that attaches a credential's access token to every request.
pub struct HubTransport {
    hub: Sheets<HttpsConnector<HttpConnector>>,
}

impl HubTransport {
    pub fn new(credential: &Credential) -> Result<Self> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        // No refresh: the hub sends this token until it stops working
        let hub = Sheets::new(client, credential.access_token.clone());

        Ok(Self { hub })
    }
}

#[async_trait]
impl SheetsTransport for HubTransport {
    #[instrument(name = "Reading range", skip(self))]
    async fn values_get(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let result = self
            .hub
            .spreadsheets()
            .values_get(spreadsheet_id, range)
            .major_dimension("ROWS")
            .doit()
            .await;
        let (_, response) = match result {
            Ok(ok) => ok,
            Err(e) => return Err(remote_error("Unable to retrieve data from sheet", e).await),
        };

        Ok(response)
    }

    #[instrument(name = "Updating range", skip(self, values))]
    async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: ValueRange,
        value_input_option: &str,
    ) -> Result<UpdateValuesResponse> {
        let result = self
            .hub
            .spreadsheets()
            .values_update(values, spreadsheet_id, range)
            .value_input_option(value_input_option)
            .doit()
            .await;
        let (_, response) = match result {
            Ok(ok) => ok,
            Err(e) => return Err(remote_error("Unable to update data on sheet", e).await),
        };

        debug!(updated_cells = ?response.updated_cells, "Range updated");

        Ok(response)
    }
}

/// Longest server message carried into an error, in characters.
const MAX_MESSAGE_CHARS: usize = 512;

/// Translate a client library failure into `AppError::Remote`, keeping the
/// status and server message when the failure carried them.
pub(crate) async fn remote_error(context: &str, err: google_sheets4::Error) -> AppError {
    match err {
        google_sheets4::Error::BadRequest(body) => {
            let error = &body["error"];
            let status = error["code"].as_u64().and_then(|c| u16::try_from(c).ok());
            let message = error["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            AppError::Remote {
                status,
                message: format!("{}: {}", context, message),
            }
        }
        google_sheets4::Error::Failure(response) => {
            let (parts, body) = response.into_parts();
            // A body that cannot be read is reported by status alone
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    debug!("Failed to read error response body: {}", e);
                    Default::default()
                }
            };
            let message = failure_message(&body).unwrap_or_else(|| {
                parts
                    .status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            AppError::Remote {
                status: Some(parts.status.as_u16()),
                message: format!("{}: {}", context, message),
            }
        }
        other => AppError::Remote {
            status: None,
            message: format!("{}: {}", context, other),
        },
    }
}

/// Server text from a non-JSON error body, shortened to `MAX_MESSAGE_CHARS`.
fn failure_message(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &text[..cut])),
        None => Some(text.to_string()),
    }
}
