use super::client::{SheetsClient, is_known_request};
use super::formatting::{self, Rgb};
use super::Block;
use crate::a1::{self, CellRange, quote_title};
use crate::error::{Error, Result};
use crate::resource::bind;
use crate::updates::{Deferred, UpdateQueue};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};

// Grid size assumed when the API leaves it out.
const DEFAULT_ROW_COUNT: u32 = 1000;
const DEFAULT_COLUMN_COUNT: u32 = 26;

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetData {
    spreadsheet_id: Option<String>,
    spreadsheet_url: Option<String>,
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
    #[serde(default)]
    named_ranges: Vec<NamedRangeData>,
}

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetProperties {
    title: Option<String>,
    locale: Option<String>,
    time_zone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    properties: SheetProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SheetProperties {
    sheet_id: Option<i32>,
    title: Option<String>,
    index: Option<u32>,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GridProperties {
    row_count: Option<u32>,
    column_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NamedRangeData {
    named_range_id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    range: GridRangeData,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GridRangeData {
    sheet_id: Option<i32>,
    start_row_index: Option<u32>,
    end_row_index: Option<u32>,
    start_column_index: Option<u32>,
    end_column_index: Option<u32>,
}

impl SpreadsheetData {
    fn sheet(&self, sheet_id: i32) -> Option<&SheetProperties> {
        self.sheets
            .iter()
            .map(|entry| &entry.properties)
            .find(|props| props.sheet_id.unwrap_or(0) == sheet_id)
    }
}

/// A spreadsheet and its queue of pending batch updates.
#[derive(Debug)]
pub struct Spreadsheet {
    data: Arc<SpreadsheetData>,
    queue: UpdateQueue,
    client: Option<SheetsClient>,
}

impl Spreadsheet {
    pub fn from_existing(raw: Value, client: Option<SheetsClient>) -> Result<Self> {
        Ok(Self {
            data: Arc::new(bind(raw)?),
            queue: UpdateQueue::new(),
            client,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.data.spreadsheet_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.data.properties.title.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.data.properties.locale.as_deref()
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.data.properties.time_zone.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.data.spreadsheet_url.as_deref()
    }

    /// Sheets in spreadsheet order.
    pub fn sheets(&self) -> Vec<Sheet> {
        self.data
            .sheets
            .iter()
            .map(|entry| self.sheet(&entry.properties))
            .collect()
    }

    fn sheet(&self, properties: &SheetProperties) -> Sheet {
        Sheet {
            properties: properties.clone(),
            spreadsheet_id: self.data.spreadsheet_id.clone(),
            client: self.client.clone(),
        }
    }

    pub fn get_sheet_by_name(&self, title: &str) -> Result<Sheet> {
        self.data
            .sheets
            .iter()
            .find(|entry| entry.properties.title.as_deref() == Some(title))
            .map(|entry| self.sheet(&entry.properties))
            .ok_or_else(|| Error::NotFound(format!("no sheet named '{}'", title)))
    }

    pub fn get_sheet_by_id(&self, sheet_id: i32) -> Result<Sheet> {
        self.data
            .sheet(sheet_id)
            .map(|props| self.sheet(props))
            .ok_or_else(|| Error::NotFound(format!("no sheet with id {}", sheet_id)))
    }

    pub fn named_ranges(&self) -> Vec<NamedRange> {
        self.data
            .named_ranges
            .iter()
            .map(|data| NamedRange {
                data: data.clone(),
                spreadsheet: Arc::clone(&self.data),
            })
            .collect()
    }

    pub fn get_named_range(&self, named_range_id: &str) -> Result<NamedRange> {
        self.named_ranges()
            .into_iter()
            .find(|range| range.id() == Some(named_range_id))
            .ok_or_else(|| Error::NotFound(format!("no named range with id '{}'", named_range_id)))
    }

    /// Requests waiting for [`Deferred::update`].
    pub fn pending(&self) -> &[Value] {
        self.queue.pending()
    }

    /// Queue a background fill for rows `start_row..end_row` of a sheet.
    pub fn format_rows(
        &mut self,
        sheet_id: i32,
        start_row: u32,
        end_row: u32,
        color: Rgb,
    ) -> Result<bool> {
        let request = formatting::background_rule(sheet_id, start_row, end_row, color)?;
        Ok(self.queue.add(request))
    }

    /// Queue a bold, frozen header row for a sheet.
    pub fn format_header(&mut self, sheet_id: i32) -> Result<bool> {
        let bold = self.queue.add(formatting::bold_rule(sheet_id, 0, 1)?);
        let frozen = self.queue.add(formatting::freeze_rule(sheet_id, 1)?);
        Ok(bold && frozen)
    }
}

#[async_trait]
impl Deferred for Spreadsheet {
    fn add_update(&mut self, update: Value) -> bool {
        if !is_known_request(&update) {
            warn!(%update, "Rejected unknown Sheets request");
            return false;
        }
        self.queue.add(update)
    }

    #[instrument(name = "Updating spreadsheet", skip(self))]
    async fn update(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let client = self.client.as_ref().ok_or_else(|| {
            Error::InvalidArgument("spreadsheet is not attached to a Sheets client".to_string())
        })?;
        let id = self
            .data
            .spreadsheet_id
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("spreadsheet has no id".to_string()))?;

        self.queue.flush(client.api(), id).await?;
        Ok(())
    }
}

/// One tab of a spreadsheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    properties: SheetProperties,
    spreadsheet_id: Option<String>,
    client: Option<SheetsClient>,
}

impl Sheet {
    /// The sheet id; the API omits it for the first sheet.
    pub fn id(&self) -> i32 {
        self.properties.sheet_id.unwrap_or(0)
    }

    pub fn title(&self) -> Option<&str> {
        self.properties.title.as_deref()
    }

    pub fn index(&self) -> u32 {
        self.properties.index.unwrap_or(0)
    }

    pub fn row_count(&self) -> u32 {
        self.properties
            .grid_properties
            .row_count
            .unwrap_or(DEFAULT_ROW_COUNT)
    }

    pub fn column_count(&self) -> u32 {
        self.properties
            .grid_properties
            .column_count
            .unwrap_or(DEFAULT_COLUMN_COUNT)
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    fn attached(&self) -> Result<(&SheetsClient, &str, &str)> {
        let client = self.client.as_ref().ok_or_else(|| {
            Error::InvalidArgument("sheet is not attached to a Sheets client".to_string())
        })?;
        let id = self
            .spreadsheet_id()
            .ok_or_else(|| Error::InvalidArgument("spreadsheet has no id".to_string()))?;
        let title = self
            .title()
            .ok_or_else(|| Error::InvalidArgument("sheet has no title".to_string()))?;
        Ok((client, id, title))
    }

    /// Every value in the sheet.
    pub async fn values(&self) -> Result<Block> {
        let (client, id, title) = self.attached()?;
        client.get_values(id, &quote_title(title)).await
    }

    /// Values in `range`, resolved against this sheet whatever sheet the
    /// range names.
    pub async fn values_in(&self, range: &CellRange) -> Result<Block> {
        let (client, id, title) = self.attached()?;
        let range = CellRange {
            sheet: Some(title.to_string()),
            ..range.clone()
        };
        client.get_values(id, &range.to_string()).await
    }

    /// Overwrite values starting at `A1`.
    pub async fn write_values(&self, rows: &[Vec<Value>]) -> Result<()> {
        let (client, id, title) = self.attached()?;
        let start = format!("{}!A1", quote_title(title));
        client.update_values(id, &start, rows).await
    }

    /// Background fill request for rows of this sheet, for
    /// [`Deferred::add_update`].
    pub fn format_rows(&self, start_row: u32, end_row: u32, color: Rgb) -> Result<Value> {
        formatting::background_rule(self.id(), start_row, end_row, color)
    }
}

/// A named range; resolves its sheet title through the owning spreadsheet.
#[derive(Debug, Clone)]
pub struct NamedRange {
    data: NamedRangeData,
    spreadsheet: Arc<SpreadsheetData>,
}

impl NamedRange {
    pub fn id(&self) -> Option<&str> {
        self.data.named_range_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn sheet_id(&self) -> i32 {
        self.data.range.sheet_id.unwrap_or(0)
    }

    pub fn start_row(&self) -> u32 {
        self.data.range.start_row_index.unwrap_or(0)
    }

    pub fn start_column(&self) -> u32 {
        self.data.range.start_column_index.unwrap_or(0)
    }

    pub fn end_row(&self) -> Option<u32> {
        self.data.range.end_row_index
    }

    pub fn end_column(&self) -> Option<u32> {
        self.data.range.end_column_index
    }

    pub fn as_a1(&self) -> Result<String> {
        let sheet = self.spreadsheet.sheet(self.sheet_id()).ok_or_else(|| {
            Error::NotFound(format!(
                "named range {:?} points at missing sheet {}",
                self.name(),
                self.sheet_id()
            ))
        })?;
        let title = sheet.title.as_deref().unwrap_or_default();
        let grid = &sheet.grid_properties;

        Ok(a1::range(
            title,
            self.start_row(),
            self.start_column(),
            self.end_row()
                .unwrap_or(grid.row_count.unwrap_or(DEFAULT_ROW_COUNT)),
            self.end_column()
                .unwrap_or(grid.column_count.unwrap_or(DEFAULT_COLUMN_COUNT)),
        ))
    }
}
