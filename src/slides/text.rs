use super::requests::{self, CellLocation, TextRange};
use crate::error::Result;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
struct TextElementData {
    start_index: Option<u32>,
    end_index: Option<u32>,
    text_run: Option<ContentData>,
    auto_text: Option<ContentData>,
    paragraph_marker: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ContentData {
    content: Option<String>,
}

/// A run of text, auto text or paragraph marker inside a shape or cell.
#[derive(Debug, Clone)]
pub struct TextElement {
    data: TextElementData,
}

impl TextElement {
    pub fn start_index(&self) -> u32 {
        self.data.start_index.unwrap_or(0)
    }

    pub fn end_index(&self) -> u32 {
        self.data.end_index.unwrap_or(0)
    }

    /// Text of a run or auto text; `None` for paragraph markers.
    pub fn text(&self) -> Option<&str> {
        self.data
            .text_run
            .as_ref()
            .or(self.data.auto_text.as_ref())
            .and_then(|c| c.content.as_deref())
    }

    pub fn is_paragraph_marker(&self) -> bool {
        self.data.paragraph_marker.is_some()
    }

    pub fn is_match(&self, regex: &Regex) -> bool {
        self.text().is_some_and(|text| matches_start(regex, text))
    }

    /// Request deleting just this element's range.
    pub fn delete_request(&self, object_id: &str, cell: Option<CellLocation>) -> Result<Value> {
        requests::delete_text(
            object_id,
            cell,
            TextRange::Fixed {
                start: self.start_index(),
                end: self.end_index(),
            },
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TextContentData {
    #[serde(default)]
    text_elements: Vec<TextElementData>,
}

/// The text body of a shape or table cell.
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    data: TextContentData,
}

impl TextContent {
    pub(crate) fn new(data: TextContentData) -> Self {
        Self { data }
    }

    pub fn elements(&self) -> Vec<TextElement> {
        self.data
            .text_elements
            .iter()
            .map(|data| TextElement { data: data.clone() })
            .collect()
    }

    pub fn text(&self) -> String {
        self.elements().iter().filter_map(TextElement::text).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn is_match(&self, regex: &Regex) -> bool {
        matches_start(regex, &self.text())
    }
}

/// Matches anchored at the start of the text, like a prefix search.
pub(crate) fn matches_start(regex: &Regex, text: &str) -> bool {
    !text.is_empty() && regex.find(text).is_some_and(|m| m.start() == 0)
}
