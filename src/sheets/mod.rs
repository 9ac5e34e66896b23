mod block;
mod client;
mod formatting;
mod spreadsheet;

pub use block::{Block, Cell};
pub use client::{GoogleSheets, SheetsClient};
pub use formatting::Rgb;
pub use spreadsheet::{NamedRange, Sheet, Spreadsheet};

use crate::error::Result;
use crate::updates::BatchUpdate;
use async_trait::async_trait;
use serde_json::Value;

/// Raw Sheets v4 calls, returning camelCase JSON.
#[async_trait]
pub trait SheetsOperations: BatchUpdate {
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value>;

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value>;

    /// Write `rows` starting at `range` with RAW input.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<Value>;

    async fn create_spreadsheet(&self, body: &Value) -> Result<Value>;
}
