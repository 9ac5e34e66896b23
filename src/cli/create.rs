use clap::ValueEnum;
use google_objects::sheets::Block;
use google_objects::{Config, Credentials, Deferred, Error, Result, SheetsClient};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// An array of objects
    Json,
    /// A header row followed by data rows
    Csv,
}

pub async fn execute(title: &str, sheet: &str, input: &Path, format: InputFormat) -> Result<()> {
    let credentials = Config::load()?.google.resolve()?;
    if !matches!(credentials, Credentials::ServiceAccount { .. }) {
        return Err(Error::MissingCredential(
            "creating a spreadsheet needs a service account".to_string(),
        ));
    }

    let rows = read_rows(input, format)?;
    let client = SheetsClient::connect(&credentials).await?;

    let mut spreadsheet = client.create_spreadsheet(title, &[sheet]).await?;
    let target = spreadsheet.get_sheet_by_name(sheet)?;
    target.write_values(&rows).await?;

    spreadsheet.format_header(target.id())?;
    spreadsheet.update().await?;

    info!(
        url = spreadsheet.url().unwrap_or_default(),
        rows = rows.len(),
        "Created spreadsheet"
    );

    Ok(())
}

/// Rows to write, header first.
fn read_rows(path: &Path, format: InputFormat) -> Result<Vec<Vec<Value>>> {
    match format {
        InputFormat::Json => {
            let records: Vec<Map<String, Value>> = serde_json::from_str(&fs::read_to_string(path)?)?;
            Ok(Block::rows_from_records(&records))
        }
        InputFormat::Csv => {
            let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
            let header = reader
                .headers()
                .map_err(csv_error)?
                .iter()
                .map(|h| Value::String(h.to_string()))
                .collect();

            let mut rows = vec![header];
            for record in reader.records() {
                let record = record.map_err(csv_error)?;
                rows.push(record.iter().map(|v| Value::String(v.to_string())).collect());
            }
            Ok(rows)
        }
    }
}

fn csv_error(e: csv::Error) -> Error {
    Error::InvalidArgument(format!("Failed to read CSV input: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_read_json_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "coffee", "amount": 3.5}}, {{"name": "tea"}}]"#).unwrap();

        let rows = read_rows(file.path(), InputFormat::Json).unwrap();
        assert_eq!(rows[0], vec![json!("amount"), json!("name")]);
        assert_eq!(rows[1], vec![json!(3.5), json!("coffee")]);
        assert_eq!(rows[2], vec![Value::Null, json!("tea")]);
    }

    #[test]
    fn test_read_csv_rows_keeps_column_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,amount\ncoffee,3.50\ntea,2").unwrap();

        let rows = read_rows(file.path(), InputFormat::Csv).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![json!("name"), json!("amount")]);
        assert_eq!(rows[2], vec![json!("tea"), json!("2")]);
    }

    #[test]
    fn test_read_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        assert!(matches!(
            read_rows(file.path(), InputFormat::Json),
            Err(Error::Serialization(_))
        ));
    }
}
