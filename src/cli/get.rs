use google_objects::{Config, Credentials, Result, SheetsClient};
use tracing::info;

pub async fn execute(spreadsheet_id: &str, sheet: &str, key: Option<&str>) -> Result<()> {
    let credentials = match key {
        Some(key) => Credentials::ApiKey(key.to_string()),
        None => Config::load()?.google.resolve()?,
    };
    let client = SheetsClient::connect(&credentials).await?;

    let spreadsheet = client.get_spreadsheet(spreadsheet_id).await?;
    let block = spreadsheet.get_sheet_by_name(sheet)?.values().await?;
    let records = block.records();
    info!(sheet, records = records.len(), "Fetched sheet");

    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}
