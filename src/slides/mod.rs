mod client;
mod element;
mod presentation;
pub mod requests;
mod text;

pub use client::{GoogleSlides, SlidesClient};
pub use element::{PageElement, Shape, Table, TableCell};
pub use presentation::{Dimension, Page, Presentation};
pub use text::{TextContent, TextElement};

use crate::error::Result;
use crate::updates::BatchUpdate;
use async_trait::async_trait;
use serde_json::Value;

/// Raw Slides v1 calls, returning camelCase JSON.
#[async_trait]
pub trait SlidesOperations: BatchUpdate {
    async fn get_presentation(&self, presentation_id: &str) -> Result<Value>;

    async fn get_page(&self, presentation_id: &str, page_id: &str) -> Result<Value>;
}
