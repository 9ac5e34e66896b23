//! Builders for Slides `batchUpdate` requests.
//!
//! Each builder returns a single request as camelCase JSON, ready for
//! [`Deferred::add_update`](crate::updates::Deferred::add_update).

use crate::error::Result;
use crate::resource::to_raw;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Every request kind a Slides batch update accepts.
const REQUEST_KINDS: &[&str] = &[
    "createSlide",
    "createShape",
    "createTable",
    "insertText",
    "insertTableRows",
    "insertTableColumns",
    "deleteTableRow",
    "deleteTableColumn",
    "replaceAllText",
    "deleteObject",
    "updatePageElementTransform",
    "updateSlidesPosition",
    "deleteText",
    "createImage",
    "createVideo",
    "createSheetsChart",
    "createLine",
    "refreshSheetsChart",
    "updateShapeProperties",
    "updateImageProperties",
    "updateVideoProperties",
    "updatePageProperties",
    "updateTableCellProperties",
    "updateLineProperties",
    "createParagraphBullets",
    "replaceAllShapesWithImage",
    "duplicateObject",
    "updateTextStyle",
    "replaceAllShapesWithSheetsChart",
    "deleteParagraphBullets",
    "updateParagraphStyle",
    "updateTableBorderProperties",
    "updateTableColumnProperties",
    "updateTableRowProperties",
    "mergeTableCells",
    "unmergeTableCells",
    "groupObjects",
    "ungroupObjects",
    "updatePageElementAltText",
    "replaceImage",
    "updateSlideProperties",
    "updatePageElementsZOrder",
    "updateLineCategory",
    "rerouteLine",
];

/// Zero-based position of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLocation {
    #[serde(rename = "rowIndex", default)]
    pub row: u32,
    #[serde(rename = "columnIndex", default)]
    pub column: u32,
}

/// The part of an element's text a deletion applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextRange {
    All,
    /// `start..end` in UTF-16 code units.
    #[serde(rename = "FIXED_RANGE")]
    Fixed {
        #[serde(rename = "startIndex")]
        start: u32,
        #[serde(rename = "endIndex")]
        end: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteObject {
    object_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubstringMatch {
    text: String,
    #[serde(default)]
    match_case: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAllText {
    #[serde(default)]
    replace_text: String,
    contains_text: SubstringMatch,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    page_object_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertText {
    object_id: String,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cell_location: Option<CellLocation>,
    #[serde(default)]
    insertion_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteText {
    object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cell_location: Option<CellLocation>,
    text_range: TextRange,
}

// The request kinds built here, in their wire form `{"<kind>": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Request {
    DeleteObject(DeleteObject),
    ReplaceAllText(ReplaceAllText),
    InsertText(InsertText),
    DeleteText(DeleteText),
}

/// Whether `update` is a single request the Slides API knows. Kinds built
/// by this module must also have the right shape.
pub(crate) fn is_known_request(update: &Value) -> bool {
    let Some(kind) = update
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.keys().next())
    else {
        return false;
    };

    match kind.as_str() {
        "deleteObject" | "replaceAllText" | "insertText" | "deleteText" => {
            serde_json::from_value::<Request>(update.clone()).is_ok()
        }
        other => REQUEST_KINDS.contains(&other),
    }
}

pub fn delete_object(object_id: &str) -> Result<Value> {
    to_raw(&Request::DeleteObject(DeleteObject {
        object_id: object_id.to_string(),
    }))
}

/// Replace every occurrence of `find` across the presentation.
pub fn replace_all_text(find: &str, replace: &str, match_case: bool) -> Result<Value> {
    to_raw(&Request::ReplaceAllText(ReplaceAllText {
        replace_text: replace.to_string(),
        contains_text: SubstringMatch {
            text: find.to_string(),
            match_case,
        },
        page_object_ids: Vec::new(),
    }))
}

pub fn insert_text(
    object_id: &str,
    text: &str,
    cell: Option<CellLocation>,
    index: u32,
) -> Result<Value> {
    to_raw(&Request::InsertText(InsertText {
        object_id: object_id.to_string(),
        text: text.to_string(),
        cell_location: cell,
        insertion_index: index,
    }))
}

pub fn delete_text(object_id: &str, cell: Option<CellLocation>, range: TextRange) -> Result<Value> {
    to_raw(&Request::DeleteText(DeleteText {
        object_id: object_id.to_string(),
        cell_location: cell,
        text_range: range,
    }))
}
