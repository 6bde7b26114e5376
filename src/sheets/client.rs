use crate::auth::{CodeSource, CredentialManager, OAuthFlow, TokenCache};
use crate::config::{ClientConfig, ColumnSpan, Settings};
use crate::error::{AppError, Result};
use crate::sheets::range::{column_range, row_range};
use crate::sheets::transport::{HubTransport, SheetsTransport};
use google_sheets4::api::{UpdateValuesResponse, ValueRange};
use tracing::{debug, instrument};

/// Values are interpreted as if typed into the UI: numbers, dates and
/// formulas are parsed by the server.
pub const USER_ENTERED: &str = "USER_ENTERED";

/// Rows of cell values, in sheet order.
pub type RangeValues = Vec<Vec<serde_json::Value>>;

/// Read and write access to a single spreadsheet document.
pub struct SpreadsheetClient<T = HubTransport> {
    transport: T,
    spreadsheet_id: String,
    sheet_name: String,
    data_columns: ColumnSpan,
}

impl SpreadsheetClient<HubTransport> {
    /// Authenticate and open `spreadsheet_id`.
    ///
    /// Uses the cached credential when there is one, otherwise runs the
    /// authorization flow through `code_source`.
    #[instrument(name = "Authenticating to Google Sheets", skip(settings, code_source))]
    pub async fn connect<S>(
        spreadsheet_id: &str,
        settings: &Settings,
        code_source: S,
    ) -> Result<Self>
    where
        S: CodeSource,
    {
        settings.validate()?;
        let config = ClientConfig::load(&settings.secret_file, &settings.scopes)?;

        let flow = OAuthFlow::new(&config, &code_source.redirect_uri())?;
        let cache = TokenCache::new(&settings.cache_dir);
        let credential = CredentialManager::new(cache, flow, code_source)
            .acquire()
            .await?;

        let transport = HubTransport::new(&credential)?;

        Ok(Self::new(spreadsheet_id, transport, settings))
    }
}

impl<T> SpreadsheetClient<T>
where
    T: SheetsTransport,
{
    pub fn new(spreadsheet_id: &str, transport: T, settings: &Settings) -> Self {
        Self {
            transport,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: settings.sheet_name.clone(),
            data_columns: settings.data_columns.clone(),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn spreadsheet_url(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", self.spreadsheet_id)
    }

    /// Read the values in `range`.
    pub async fn get(&self, range: &str) -> Result<RangeValues> {
        let response = self
            .transport
            .values_get(&self.spreadsheet_id, range)
            .await?;

        Ok(response.values.unwrap_or_default())
    }

    /// Write `values` into `range` exactly as given.
    pub async fn update(&self, range: &str, values: RangeValues) -> Result<UpdateValuesResponse> {
        debug!(?values, "Updating range {}", range);

        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(range.to_string()),
            values: Some(values),
        };

        self.transport
            .values_update(&self.spreadsheet_id, range, value_range, USER_ENTERED)
            .await
    }

    /// Write `values` into the first row below the existing data.
    ///
    /// The target row is derived from how many rows the data columns hold,
    /// so at least one row (normally a header) must already exist; an empty
    /// sheet is reported as `AppError::EmptyResult`.
    ///
    /// Not atomic: two writers appending at the same time can compute the
    /// same row and overwrite each other.
    #[instrument(name = "Appending row", skip(self, values), fields(sheet = %self.sheet_name))]
    pub async fn append_row(&self, values: RangeValues) -> Result<UpdateValuesResponse> {
        let read_range = column_range(&self.sheet_name, &self.data_columns);
        let existing = self.get(&read_range).await?;

        if existing.is_empty() {
            return Err(AppError::EmptyResult(read_range));
        }

        let write_row = existing.len() + 1;
        debug!(existing_rows = existing.len(), write_row, "Computed next empty row");

        let update_range = row_range(&self.sheet_name, &self.data_columns, write_row);
        self.update(&update_range, values).await
    }
}

#[cfg(test)]
mod mocks {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    pub(crate) struct RecordedUpdate {
        pub spreadsheet_id: String,
        pub range: String,
        pub values: ValueRange,
        pub value_input_option: String,
    }

    #[derive(Clone, Default)]
    pub(crate) struct MockTransport {
        pub rows: Option<RangeValues>,
        pub fail_with: Option<(u16, String)>,
        pub reads: Arc<Mutex<Vec<String>>>,
        pub updates: Arc<Mutex<Vec<RecordedUpdate>>>,
    }

    impl MockTransport {
        pub(crate) fn with_rows(rows: RangeValues) -> Self {
            Self {
                rows: Some(rows),
                ..Default::default()
            }
        }

        pub(crate) fn failing(status: u16, message: &str) -> Self {
            Self {
                fail_with: Some((status, message.to_string())),
                ..Default::default()
            }
        }

        fn check_failure(&self) -> Result<()> {
            match &self.fail_with {
                Some((status, message)) => Err(AppError::Remote {
                    status: Some(*status),
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl SheetsTransport for MockTransport {
        async fn values_get(&self, _spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
            self.reads.lock().unwrap().push(range.to_string());
            self.check_failure()?;
            Ok(ValueRange {
                range: Some(range.to_string()),
                values: self.rows.clone(),
                ..Default::default()
            })
        }

        async fn values_update(
            &self,
            spreadsheet_id: &str,
            range: &str,
            values: ValueRange,
            value_input_option: &str,
        ) -> Result<UpdateValuesResponse> {
            self.check_failure()?;
            let rows = values.values.as_deref().unwrap_or_default();
            let updated_cells = rows.iter().map(Vec::len).sum::<usize>() as i32;
            self.updates.lock().unwrap().push(RecordedUpdate {
                spreadsheet_id: spreadsheet_id.to_string(),
                range: range.to_string(),
                values,
                value_input_option: value_input_option.to_string(),
            });
            Ok(UpdateValuesResponse {
                spreadsheet_id: Some(spreadsheet_id.to_string()),
                updated_range: Some(range.to_string()),
                updated_cells: Some(updated_cells),
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockTransport;
    use super::*;
    use serde_json::json;

    const SPREADSHEET_ID: &str = "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms";

    fn client(transport: MockTransport) -> SpreadsheetClient<MockTransport> {
        SpreadsheetClient::new(SPREADSHEET_ID, transport, &Settings::default())
    }

    fn row(cells: &[&str]) -> Vec<serde_json::Value> {
        cells.iter().map(|c| json!(c)).collect()
    }

    #[tokio::test]
    async fn test_get_returns_value_matrix() {
        let rows = vec![row(&["Name", "Guests", "Diet"]), vec![json!("Ada"), json!(2), json!("")]];
        let transport = MockTransport::with_rows(rows.clone());
        let client = client(transport.clone());

        let values = client.get("RSVP!A1:C2").await.unwrap();

        assert_eq!(values, rows);
        assert_eq!(*transport.reads.lock().unwrap(), vec!["RSVP!A1:C2".to_string()]);
    }

    #[tokio::test]
    async fn test_get_without_values_is_empty() {
        let client = client(MockTransport::default());

        assert!(client.get("RSVP!A:C").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_passes_values_through() {
        let transport = MockTransport::default();
        let client = client(transport.clone());
        let values = vec![vec![json!("=SUM(B1:B2)"), json!("1/2/2024"), json!(3.5)]];

        let response = client.update("RSVP!A5:C5", values.clone()).await.unwrap();

        assert_eq!(response.updated_cells, Some(3));
        let updates = transport.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].spreadsheet_id, SPREADSHEET_ID);
        assert_eq!(updates[0].range, "RSVP!A5:C5");
        assert_eq!(updates[0].value_input_option, "USER_ENTERED");
        assert_eq!(updates[0].values.values, Some(values));
    }

    #[tokio::test]
    async fn test_remote_failure_is_wrapped() {
        let client = client(MockTransport::failing(404, "Requested entity was not found."));

        let get_err = client.get("RSVP!A:C").await.unwrap_err();
        assert!(matches!(
            get_err,
            AppError::Remote { status: Some(404), ref message } if message == "Requested entity was not found."
        ));

        let update_err = client.update("RSVP!A1:C1", vec![row(&["x"])]).await.unwrap_err();
        assert!(matches!(update_err, AppError::Remote { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn test_append_row_targets_next_row() {
        let transport =
            MockTransport::with_rows(vec![row(&["a", "b", "c"]), row(&["d", "e", "f"])]);
        let client = client(transport.clone());

        client.append_row(vec![row(&["x", "y", "z"])]).await.unwrap();

        assert_eq!(*transport.reads.lock().unwrap(), vec!["RSVP!A:C".to_string()]);
        let updates = transport.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].range, "RSVP!A3:C3");
        assert_eq!(updates[0].values.values, Some(vec![row(&["x", "y", "z"])]));
        assert_eq!(updates[0].value_input_option, USER_ENTERED);
    }

    #[tokio::test]
    async fn test_append_row_uses_configured_layout() {
        let settings = Settings {
            sheet_name: "Guest List".to_string(),
            data_columns: ColumnSpan::new("B", "D").unwrap(),
            ..Settings::default()
        };
        let rows = (0..9).map(|i| row(&[i.to_string().as_str()])).collect();
        let transport = MockTransport::with_rows(rows);
        let client = SpreadsheetClient::new(SPREADSHEET_ID, transport.clone(), &settings);

        client.append_row(vec![row(&["p", "q", "r"])]).await.unwrap();

        assert_eq!(
            *transport.reads.lock().unwrap(),
            vec!["'Guest List'!B:D".to_string()]
        );
        assert_eq!(transport.updates.lock().unwrap()[0].range, "'Guest List'!B10:D10");
    }

    #[tokio::test]
    async fn test_append_row_on_empty_sheet_is_error() {
        let transport = MockTransport::with_rows(Vec::new());
        let client = client(transport.clone());

        let err = client.append_row(vec![row(&["x", "y", "z"])]).await.unwrap_err();

        assert!(matches!(err, AppError::EmptyResult(ref range) if range == "RSVP!A:C"));
        assert!(transport.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_row_read_failure_skips_update() {
        let transport = MockTransport::failing(500, "Internal error");
        let client = client(transport.clone());

        let err = client.append_row(vec![row(&["x"])]).await.unwrap_err();

        assert!(matches!(err, AppError::Remote { status: Some(500), .. }));
        assert!(transport.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn test_spreadsheet_url() {
        let client = client(MockTransport::default());
        assert_eq!(
            client.spreadsheet_url(),
            format!("https://docs.google.com/spreadsheets/d/{}", SPREADSHEET_ID)
        );
    }
}
