use super::requests::{self, CellLocation, TextRange};
use super::text::{TextContent, TextContentData, matches_start};
use crate::error::{Error, Result};
use crate::resource::bind;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

type Constructor = fn(String, &str, Value) -> Result<PageElement>;

// Payload key identifying each element kind, after snake-casing.
static REGISTRY: &[(&str, Constructor)] = &[
    ("shape", shape),
    ("table", table),
    ("image", other),
    ("video", other),
    ("line", other),
    ("word_art", other),
    ("sheets_chart", other),
    ("speaker_spotlight", other),
];

const GROUP_KEY: &str = "element_group";

/// An element on a page. Groups are flattened into their children.
#[derive(Debug, Clone)]
pub enum PageElement {
    Shape(Shape),
    Table(Table),
    Other { id: String, kind: String },
}

impl PageElement {
    pub fn id(&self) -> &str {
        match self {
            PageElement::Shape(shape) => &shape.id,
            PageElement::Table(table) => &table.id,
            PageElement::Other { id, .. } => id,
        }
    }

    /// Payload discriminator, e.g. `shape`, `table` or `sheets_chart`.
    pub fn kind(&self) -> &str {
        match self {
            PageElement::Shape(_) => "shape",
            PageElement::Table(_) => "table",
            PageElement::Other { kind, .. } => kind,
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            PageElement::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            PageElement::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn delete_request(&self) -> Result<Value> {
        requests::delete_object(self.id())
    }

    /// Texts of this element (or of its table cells) matching `regex`.
    pub(crate) fn matching_texts(&self, regex: &Regex) -> Vec<String> {
        match self {
            PageElement::Shape(shape) if shape.is_match(regex) => vec![shape.text()],
            PageElement::Table(table) => table
                .cells()
                .filter(|cell| cell.is_match(regex))
                .map(TableCell::text)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Build the elements of a raw `pageElements` list.
pub(crate) fn load_elements(raw: &[Value]) -> Result<Vec<PageElement>> {
    let mut elements = Vec::new();
    for element in raw {
        load(element.clone(), &mut elements)?;
    }
    Ok(elements)
}

fn load(raw: Value, out: &mut Vec<PageElement>) -> Result<()> {
    let mut map: Map<String, Value> = bind(raw)?;

    if let Some(group) = map.remove(GROUP_KEY) {
        let children = match group.get("children") {
            Some(Value::Array(children)) => children.clone(),
            _ => Vec::new(),
        };
        for child in children {
            load(child, out)?;
        }
        return Ok(());
    }

    let id = match map.remove("object_id") {
        Some(Value::String(id)) => id,
        _ => return Err(Error::Payload("page element without objectId".to_string())),
    };

    match REGISTRY.iter().find(|(key, _)| map.contains_key(*key)) {
        Some((key, constructor)) => {
            let payload = map.remove(*key).unwrap_or_default();
            out.push(constructor(id, key, payload)?);
        }
        None => out.push(PageElement::Other {
            id,
            kind: "unknown".to_string(),
        }),
    }
    Ok(())
}

fn shape(id: String, _kind: &str, payload: Value) -> Result<PageElement> {
    let data: ShapeData = bind(payload)?;
    Ok(PageElement::Shape(Shape {
        id,
        shape_type: data.shape_type,
        text: data.text.map(TextContent::new),
    }))
}

fn table(id: String, _kind: &str, payload: Value) -> Result<PageElement> {
    let data: TableData = bind(payload)?;
    let rows = data
        .table_rows
        .into_iter()
        .map(|row| {
            row.table_cells
                .into_iter()
                .map(|cell| TableCell {
                    table_id: id.clone(),
                    row: cell.location.row_index.unwrap_or(0),
                    column: cell.location.column_index.unwrap_or(0),
                    row_span: cell.row_span.unwrap_or(1),
                    column_span: cell.column_span.unwrap_or(1),
                    text: cell.text.map(TextContent::new),
                })
                .collect()
        })
        .collect();

    Ok(PageElement::Table(Table {
        id,
        row_count: data.rows.unwrap_or(0),
        column_count: data.columns.unwrap_or(0),
        rows,
    }))
}

fn other(id: String, kind: &str, _payload: Value) -> Result<PageElement> {
    Ok(PageElement::Other {
        id,
        kind: kind.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ShapeData {
    shape_type: Option<String>,
    text: Option<TextContentData>,
}

#[derive(Debug, Default, Deserialize)]
struct TableData {
    rows: Option<u32>,
    columns: Option<u32>,
    #[serde(default)]
    table_rows: Vec<TableRowData>,
}

#[derive(Debug, Default, Deserialize)]
struct TableRowData {
    #[serde(default)]
    table_cells: Vec<TableCellData>,
}

#[derive(Debug, Default, Deserialize)]
struct TableCellData {
    #[serde(default)]
    location: LocationData,
    row_span: Option<u32>,
    column_span: Option<u32>,
    text: Option<TextContentData>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationData {
    row_index: Option<u32>,
    column_index: Option<u32>,
}

/// A shape, usually a text box.
#[derive(Debug, Clone)]
pub struct Shape {
    id: String,
    shape_type: Option<String>,
    text: Option<TextContent>,
}

impl Shape {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shape_type(&self) -> Option<&str> {
        self.shape_type.as_deref()
    }

    pub fn text_content(&self) -> Option<&TextContent> {
        self.text.as_ref()
    }

    pub fn text(&self) -> String {
        self.text.as_ref().map(TextContent::text).unwrap_or_default()
    }

    pub fn is_match(&self, regex: &Regex) -> bool {
        matches_start(regex, &self.text())
    }

    /// Requests replacing the shape's text with `text`.
    pub fn set_text_requests(&self, text: &str) -> Result<Vec<Value>> {
        set_text(&self.id, None, !self.text().is_empty(), text)
    }

    pub fn clear_text_request(&self) -> Result<Value> {
        requests::delete_text(&self.id, None, TextRange::All)
    }

    pub fn delete_request(&self) -> Result<Value> {
        requests::delete_object(&self.id)
    }
}

fn set_text(
    object_id: &str,
    cell: Option<CellLocation>,
    has_text: bool,
    text: &str,
) -> Result<Vec<Value>> {
    let mut updates = Vec::with_capacity(2);
    if has_text {
        updates.push(requests::delete_text(object_id, cell, TextRange::All)?);
    }
    updates.push(requests::insert_text(object_id, text, cell, 0)?);
    Ok(updates)
}

#[derive(Debug, Clone)]
pub struct Table {
    id: String,
    row_count: u32,
    column_count: u32,
    rows: Vec<Vec<TableCell>>,
}

impl Table {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    pub fn rows(&self) -> &[Vec<TableCell>] {
        &self.rows
    }

    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flatten()
    }

    pub fn cell(&self, row: u32, column: u32) -> Option<&TableCell> {
        self.cells()
            .find(|cell| cell.row == row && cell.column == column)
    }

    pub fn delete_request(&self) -> Result<Value> {
        requests::delete_object(&self.id)
    }
}

#[derive(Debug, Clone)]
pub struct TableCell {
    table_id: String,
    row: u32,
    column: u32,
    row_span: u32,
    column_span: u32,
    text: Option<TextContent>,
}

impl TableCell {
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn row_span(&self) -> u32 {
        self.row_span
    }

    pub fn column_span(&self) -> u32 {
        self.column_span
    }

    pub fn location(&self) -> CellLocation {
        CellLocation {
            row: self.row,
            column: self.column,
        }
    }

    pub fn text_content(&self) -> Option<&TextContent> {
        self.text.as_ref()
    }

    pub fn text(&self) -> String {
        self.text.as_ref().map(TextContent::text).unwrap_or_default()
    }

    pub fn is_match(&self, regex: &Regex) -> bool {
        matches_start(regex, &self.text())
    }

    pub fn set_text_requests(&self, text: &str) -> Result<Vec<Value>> {
        set_text(
            &self.table_id,
            Some(self.location()),
            !self.text().is_empty(),
            text,
        )
    }

    pub fn clear_text_request(&self) -> Result<Value> {
        requests::delete_text(&self.table_id, Some(self.location()), TextRange::All)
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::page_elements;
    use super::*;
    use serde_json::json;

    fn elements() -> Vec<PageElement> {
        match page_elements() {
            Value::Array(raw) => load_elements(&raw).unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_groups_are_flattened() {
        let elements = elements();
        let ids: Vec<&str> = elements.iter().map(PageElement::id).collect();
        assert_eq!(ids, ["title", "empty", "chart", "table1", "pic"]);

        let kinds: Vec<&str> = elements.iter().map(PageElement::kind).collect();
        assert_eq!(kinds, ["shape", "shape", "sheets_chart", "table", "image"]);
    }

    #[test]
    fn test_shape() {
        let elements = elements();
        let shape = elements[0].as_shape().unwrap();
        assert_eq!(shape.shape_type(), Some("TEXT_BOX"));
        assert_eq!(shape.text(), "{{title}}");
        assert!(shape.is_match(&Regex::new(r"\{\{\w+\}\}").unwrap()));

        let empty = elements[1].as_shape().unwrap();
        assert_eq!(empty.text(), "");
        assert!(!empty.is_match(&Regex::new(".*").unwrap()));
    }

    #[test]
    fn test_set_text_deletes_existing_text_first() {
        let elements = elements();

        let updates = elements[0].as_shape().unwrap().set_text_requests("Q3").unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0]["deleteText"]["textRange"]["type"], json!("ALL"));
        assert_eq!(updates[1]["insertText"]["text"], json!("Q3"));

        let updates = elements[1].as_shape().unwrap().set_text_requests("x").unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].get("insertText").is_some());
    }

    #[test]
    fn test_table_cells() {
        let elements = elements();
        let table = elements[3].as_table().unwrap();
        assert_eq!((table.row_count(), table.column_count()), (2, 2));
        assert_eq!(table.cells().count(), 3);

        let cell = table.cell(0, 1).unwrap();
        assert_eq!(cell.text(), "{{name}}");

        let merged = table.cell(1, 0).unwrap();
        assert_eq!(merged.column_span(), 2);
        assert_eq!(merged.text(), "");

        assert_eq!(
            cell.clear_text_request().unwrap(),
            json!({"deleteText": {
                "objectId": "table1",
                "cellLocation": {"rowIndex": 0, "columnIndex": 1},
                "textRange": {"type": "ALL"}
            }})
        );
    }

    #[test]
    fn test_matching_texts() {
        let elements = elements();
        let regex = Regex::new(r"\{\{\w+\}\}").unwrap();
        let found: Vec<String> = elements.iter().flat_map(|e| e.matching_texts(&regex)).collect();
        assert_eq!(found, ["{{title}}", "{{name}}"]);
    }

    #[test]
    fn test_element_without_id_is_rejected() {
        let raw = vec![json!({"shape": {}})];
        assert!(matches!(load_elements(&raw), Err(Error::Payload(_))));
    }

    #[test]
    fn test_delete_request() {
        let elements = elements();
        assert_eq!(
            elements[4].delete_request().unwrap(),
            json!({"deleteObject": {"objectId": "pic"}})
        );
    }
}
