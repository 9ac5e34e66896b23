use crate::error::{Error, Result};
use crate::resource::to_raw;
use google_sheets4::FieldMask;
use google_sheets4::api::{
    CellData, CellFormat, Color, GridProperties, GridRange, RepeatCellRequest, Request,
    SheetProperties, TextFormat, UpdateSheetPropertiesRequest,
};
use serde_json::Value;

/// An RGB colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Rgb {
    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .map(|c| c as f32 / 255.0)
        };

        match (digits.len(), channel(0), channel(2), channel(4)) {
            (6, Some(red), Some(green), Some(blue)) => Ok(Self { red, green, blue }),
            _ => Err(Error::InvalidArgument(format!("invalid colour '{}'", hex))),
        }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color {
            red: Some(rgb.red),
            green: Some(rgb.green),
            blue: Some(rgb.blue),
            alpha: None,
        }
    }
}

fn grid_index(index: u32) -> Result<i32> {
    i32::try_from(index)
        .map_err(|_| Error::InvalidArgument(format!("grid index {} out of range", index)))
}

fn row_range(sheet_id: i32, start_row: u32, end_row: u32) -> Result<GridRange> {
    Ok(GridRange {
        sheet_id: Some(sheet_id),
        start_row_index: Some(grid_index(start_row)?),
        end_row_index: Some(grid_index(end_row)?),
        start_column_index: None,
        end_column_index: None,
    })
}

/// Fill the background of rows `start_row..end_row`.
pub(crate) fn background_rule(
    sheet_id: i32,
    start_row: u32,
    end_row: u32,
    color: Rgb,
) -> Result<Value> {
    to_raw(&Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(row_range(sheet_id, start_row, end_row)?),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    background_color: Some(color.into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["userEnteredFormat(backgroundColor)"])),
        }),
        ..Default::default()
    })
}

/// Make rows `start_row..end_row` bold.
pub(crate) fn bold_rule(sheet_id: i32, start_row: u32, end_row: u32) -> Result<Value> {
    to_raw(&Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(row_range(sheet_id, start_row, end_row)?),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    text_format: Some(TextFormat {
                        bold: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["userEnteredFormat.textFormat.bold"])),
        }),
        ..Default::default()
    })
}

/// Freeze the first `rows` rows.
pub(crate) fn freeze_rule(sheet_id: i32, rows: u32) -> Result<Value> {
    to_raw(&Request {
        update_sheet_properties: Some(UpdateSheetPropertiesRequest {
            properties: Some(SheetProperties {
                sheet_id: Some(sheet_id),
                grid_properties: Some(GridProperties {
                    frozen_row_count: Some(grid_index(rows)?),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["gridProperties.frozenRowCount"])),
        }),
        ..Default::default()
    })
}
