use super::{Block, SheetsOperations, Spreadsheet};
use crate::auth::{Access, Authorizer, Connector, authorize, https_connector};
use crate::config::{Credentials, scope_url};
use crate::error::Result;
use crate::resource::{to_api, to_raw};
use crate::updates::BatchUpdate;
use async_trait::async_trait;
use google_sheets4::Sheets;
use google_sheets4::api::{BatchUpdateSpreadsheetRequest, Request, ValueRange};
use google_sheets4::common::NoToken;
use hyper_util::client::legacy::Client;
use serde_json::{Value, json};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Sheets v4 backed by the generated hub.
pub struct GoogleSheets {
    hub: Sheets<Connector>,
    access: Access,
}

impl GoogleSheets {
    #[instrument(name = "Connecting to Google Sheets", skip_all)]
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let authorizer = Authorizer::from_credentials(credentials).await?;
        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https_connector()?);

        let access = authorizer.access(DEFAULT_SCOPE);
        let hub = match authorizer {
            Authorizer::ApiKey(_) => Sheets::new(client, NoToken),
            Authorizer::ServiceAccount { auth, .. } => Sheets::new(client, auth),
        };

        Ok(Self { hub, access })
    }
}

fn batch_request(requests: &[Value]) -> Result<BatchUpdateSpreadsheetRequest> {
    Ok(BatchUpdateSpreadsheetRequest {
        requests: Some(to_api(Value::Array(requests.to_vec()))?),
        ..Default::default()
    })
}

/// Whether `update` is a single request of a kind the Sheets API knows,
/// with a body that fits it.
pub(crate) fn is_known_request(update: &Value) -> bool {
    let Some(kind) = update
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.keys().next())
    else {
        return false;
    };

    // unknown kinds deserialize to an empty request and vanish on the way back
    to_api::<Request>(update.clone())
        .and_then(|request| to_raw(&request))
        .is_ok_and(|typed| typed.get(kind).is_some())
}

fn spreadsheet_body(title: &str, sheet_titles: &[&str]) -> Value {
    let sheets: Vec<Value> = sheet_titles
        .iter()
        .map(|title| json!({"properties": {"title": title}}))
        .collect();
    json!({
        "properties": {"title": title},
        "sheets": sheets,
    })
}

#[async_trait]
impl BatchUpdate for GoogleSheets {
    async fn batch_update(&self, spreadsheet_id: &str, requests: &[Value]) -> Result<()> {
        let batch_update = batch_request(requests)?;

        authorize!(
            self.hub.spreadsheets().batch_update(batch_update, spreadsheet_id),
            self.access
        )
        .doit()
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SheetsOperations for GoogleSheets {
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value> {
        let (_, spreadsheet) = authorize!(self.hub.spreadsheets().get(spreadsheet_id), self.access)
            .include_grid_data(false)
            .doit()
            .await?;
        to_raw(&spreadsheet)
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value> {
        let (_, values) = authorize!(
            self.hub.spreadsheets().values_get(spreadsheet_id, range),
            self.access
        )
        .major_dimension("ROWS")
        .value_render_option("FORMATTED_VALUE")
        .doit()
        .await?;
        to_raw(&values)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<Value> {
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(range.to_string()),
            values: Some(rows.to_vec()),
        };

        let (_, response) = authorize!(
            self.hub
                .spreadsheets()
                .values_update(value_range, spreadsheet_id, range),
            self.access
        )
        .value_input_option("RAW")
        .doit()
        .await?;
        to_raw(&response)
    }

    async fn create_spreadsheet(&self, body: &Value) -> Result<Value> {
        let request: google_sheets4::api::Spreadsheet = to_api(body.clone())?;
        let (_, spreadsheet) = authorize!(self.hub.spreadsheets().create(request), self.access)
            .doit()
            .await?;
        to_raw(&spreadsheet)
    }
}

/// Sheets facade returning [`Spreadsheet`] and [`Block`] objects.
#[derive(Clone)]
pub struct SheetsClient {
    api: Arc<dyn SheetsOperations>,
}

impl fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsClient").finish_non_exhaustive()
    }
}

impl SheetsClient {
    pub fn new(api: impl SheetsOperations + 'static) -> Self {
        Self { api: Arc::new(api) }
    }

    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        Ok(Self::new(GoogleSheets::connect(credentials).await?))
    }

    pub async fn from_api_key(api_key: &str) -> Result<Self> {
        Self::connect(&Credentials::ApiKey(api_key.to_string())).await
    }

    pub async fn from_service_account(
        key_path: impl Into<PathBuf>,
        delegated_user: Option<&str>,
        scopes: &[&str],
    ) -> Result<Self> {
        Self::connect(&Credentials::ServiceAccount {
            key_path: key_path.into(),
            delegated_user: delegated_user.map(str::to_string),
            scopes: scopes.iter().map(|s| scope_url(s)).collect(),
        })
        .await
    }

    pub(crate) fn api(&self) -> &dyn SheetsOperations {
        self.api.as_ref()
    }

    #[instrument(name = "Fetching spreadsheet", skip(self))]
    pub async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let raw = self.api.get_spreadsheet(spreadsheet_id).await?;
        Spreadsheet::from_existing(raw, Some(self.clone()))
    }

    /// Create a spreadsheet with one sheet per title, in order.
    #[instrument(name = "Creating spreadsheet", skip(self))]
    pub async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_titles: &[&str],
    ) -> Result<Spreadsheet> {
        let body = spreadsheet_body(title, sheet_titles);
        let raw = self.api.create_spreadsheet(&body).await?;
        let spreadsheet = Spreadsheet::from_existing(raw, Some(self.clone()))?;
        debug!(id = ?spreadsheet.id(), "Created spreadsheet");

        Ok(spreadsheet)
    }

    #[instrument(name = "Fetching values", skip(self))]
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Block> {
        let raw = self.api.get_values(spreadsheet_id, range).await?;
        Block::from_existing(raw)
    }

    #[instrument(name = "Writing values", skip(self, rows), fields(rows = rows.len()))]
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<()> {
        let response = self.api.update_values(spreadsheet_id, range, rows).await?;
        debug!(updated = ?response.get("updatedCells"), "Wrote values");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::MockSheets;
    use super::*;
    use crate::a1::CellRange;
    use crate::error::Error;
    use crate::sheets::Rgb;
    use crate::sheets::formatting;
    use crate::updates::{Deferred, with_updates};

    #[tokio::test]
    async fn test_sheets() {
        let client = SheetsClient::new(MockSheets::default());
        let spreadsheet = client.get_spreadsheet("ss1").await.unwrap();

        let sheets = spreadsheet.sheets();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].title(), Some("Sheet1"));
        assert_eq!(sheets[1].title(), Some("Sheet2"));
    }

    #[tokio::test]
    async fn test_named_range() {
        let client = SheetsClient::new(MockSheets::default());
        let spreadsheet = client.get_spreadsheet("ss1").await.unwrap();

        let named = spreadsheet.named_ranges();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].as_a1().unwrap(), "'Sheet1'!A1:A2");
    }

    #[tokio::test]
    async fn test_sheet_values() {
        let mock = MockSheets::default();
        let client = SheetsClient::new(mock.clone());
        let sheet = client
            .get_spreadsheet("ss1")
            .await
            .unwrap()
            .get_sheet_by_name("Sheet1")
            .unwrap();

        let block = sheet.values().await.unwrap();
        assert_eq!(block.height(), 2);
        assert!(block.cell(1, 1).unwrap().is_numeric());
        assert_eq!(block.records()[0]["name"], json!("coffee"));

        let range = CellRange::parse("Other!B2:C3").unwrap();
        sheet.values_in(&range).await.unwrap();

        assert_eq!(
            *mock.ranges.lock().unwrap(),
            vec!["'Sheet1'".to_string(), "'Sheet1'!B2:C3".to_string()]
        );
    }

    #[tokio::test]
    async fn test_write_values() {
        let mock = MockSheets::default();
        let client = SheetsClient::new(mock.clone());
        let sheet = client
            .get_spreadsheet("ss1")
            .await
            .unwrap()
            .get_sheet_by_id(1)
            .unwrap();

        let rows = vec![vec![json!("a"), json!(1)]];
        sheet.write_values(&rows).await.unwrap();

        let writes = mock.writes.lock().unwrap();
        assert_eq!(writes[0].0, "'Sheet2'!A1");
        assert_eq!(writes[0].1, rows);
    }

    #[tokio::test]
    async fn test_create_spreadsheet() {
        let mock = MockSheets::default();
        let client = SheetsClient::new(mock.clone());

        let spreadsheet = client
            .create_spreadsheet("Budget", &["Income", "Costs"])
            .await
            .unwrap();

        assert_eq!(spreadsheet.id(), Some("new1"));
        assert_eq!(spreadsheet.title(), Some("Budget"));
        let titles: Vec<_> = spreadsheet
            .sheets()
            .iter()
            .map(|s| s.title().unwrap_or_default().to_string())
            .collect();
        assert_eq!(titles, ["Income", "Costs"]);
        assert_eq!(
            mock.created.lock().unwrap()[0]["sheets"][1]["properties"]["title"],
            json!("Costs")
        );
    }

    #[tokio::test]
    async fn test_update_flushes_once_in_order() {
        let mock = MockSheets::default();
        let client = SheetsClient::new(mock.clone());
        let mut spreadsheet = client.get_spreadsheet("ss1").await.unwrap();

        spreadsheet.format_rows(0, 0, 1, Rgb::new(1.0, 0.0, 0.0)).unwrap();
        spreadsheet.add_update(json!({"deleteSheet": {"sheetId": 1}}));
        spreadsheet.update().await.unwrap();
        // nothing left to send
        spreadsheet.update().await.unwrap();

        let batches = mock.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, "ss1");
        assert!(batches[0].1[0].get("repeatCell").is_some());
        assert!(batches[0].1[1].get("deleteSheet").is_some());
        assert!(spreadsheet.pending().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_keeps_queue() {
        let mock = MockSheets::default();
        *mock.fail_batch.lock().unwrap() = true;
        let client = SheetsClient::new(mock.clone());
        let mut spreadsheet = client.get_spreadsheet("ss1").await.unwrap();

        spreadsheet.add_update(json!({"deleteSheet": {"sheetId": 1}}));
        assert!(matches!(
            spreadsheet.update().await,
            Err(Error::Upstream(_))
        ));
        assert_eq!(spreadsheet.pending().len(), 1);

        *mock.fail_batch.lock().unwrap() = false;
        spreadsheet.update().await.unwrap();
        assert_eq!(mock.batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_queued_requests_convert_to_api_types() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        let requests = vec![
            formatting::background_rule(0, 0, 1, red).unwrap(),
            formatting::bold_rule(0, 0, 1).unwrap(),
            formatting::freeze_rule(0, 1).unwrap(),
            json!({"deleteSheet": {"sheetId": 1}}),
        ];

        let batch = batch_request(&requests).unwrap();
        let typed = batch.requests.unwrap();
        assert_eq!(typed.len(), 4);

        let repeat = typed[0].repeat_cell.as_ref().unwrap();
        assert!(repeat.fields.is_some());
        assert_eq!(
            to_raw(&typed[0]).unwrap()["repeatCell"]["fields"],
            json!("userEnteredFormat(backgroundColor)")
        );
        assert!(typed[2].update_sheet_properties.is_some());
        assert_eq!(typed[3].delete_sheet.as_ref().unwrap().sheet_id, Some(1));

        // nothing is lost on the way to the wire
        for (raw, request) in requests.iter().zip(&typed) {
            assert_eq!(&to_raw(request).unwrap(), raw);
        }
    }

    #[test]
    fn test_spreadsheet_body_converts_to_api_type() {
        let body = spreadsheet_body("Budget", &["Income", "Costs"]);
        let typed: google_sheets4::api::Spreadsheet = to_api(body).unwrap();

        assert_eq!(
            typed.properties.unwrap().title.as_deref(),
            Some("Budget")
        );
        let sheets = typed.sheets.unwrap();
        assert_eq!(
            sheets[1].properties.as_ref().unwrap().title.as_deref(),
            Some("Costs")
        );
    }

    #[test]
    fn test_known_requests() {
        assert!(is_known_request(&json!({"deleteSheet": {"sheetId": 1}})));
        assert!(is_known_request(
            &formatting::freeze_rule(0, 1).unwrap()
        ));

        assert!(!is_known_request(&json!({"deleteSheeet": {"sheetId": 1}})));
        assert!(!is_known_request(&json!({"deleteSheet": "Sheet2"})));
        assert!(!is_known_request(&json!({})));
    }

    #[tokio::test]
    async fn test_add_update_rejects_unknown_kind() {
        let mock = MockSheets::default();
        let client = SheetsClient::new(mock.clone());
        let mut spreadsheet = client.get_spreadsheet("ss1").await.unwrap();

        assert!(!spreadsheet.add_update(json!({"deleteSheeet": {"sheetId": 1}})));
        assert!(spreadsheet.add_update(json!({"deleteSheet": {"sheetId": 1}})));
        spreadsheet.update().await.unwrap();

        let batches = mock.batches.lock().unwrap();
        assert_eq!(batches[0].1, vec![json!({"deleteSheet": {"sheetId": 1}})]);
    }

    #[tokio::test]
    async fn test_with_updates_flushes_after_scope() {
        let mock = MockSheets::default();
        let client = SheetsClient::new(mock.clone());
        let mut spreadsheet = client.get_spreadsheet("ss1").await.unwrap();

        let result = with_updates(&mut spreadsheet, |s| {
            s.format_header(0)?;
            Err::<(), _>(Error::InvalidArgument("stop".to_string()))
        })
        .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        let batches = mock.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].1.len(), 2);
    }
}
