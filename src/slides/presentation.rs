use super::client::SlidesClient;
use super::element::{PageElement, load_elements};
use super::requests;
use crate::error::{Error, Result};
use crate::resource::bind;
use crate::updates::{Deferred, UpdateQueue};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

#[derive(Debug, Default, Deserialize)]
struct PresentationData {
    presentation_id: Option<String>,
    title: Option<String>,
    locale: Option<String>,
    page_size: Option<SizeData>,
    #[serde(default)]
    slides: Vec<Value>,
    #[serde(default)]
    masters: Vec<Value>,
    #[serde(default)]
    layouts: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SizeData {
    width: Option<Dimension>,
    height: Option<Dimension>,
}

/// A length on a page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dimension {
    #[serde(default)]
    pub magnitude: f64,
    /// `EMU` or `PT`.
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageData {
    object_id: Option<String>,
    page_type: Option<String>,
    #[serde(default)]
    page_elements: Vec<Value>,
}

/// A slide, master or layout.
#[derive(Debug, Clone)]
pub struct Page {
    id: Option<String>,
    page_type: Option<String>,
    elements: Vec<Value>,
}

impl Page {
    pub fn from_existing(raw: Value) -> Result<Self> {
        let data: PageData = bind(raw)?;
        Ok(Self {
            id: data.object_id,
            page_type: data.page_type,
            elements: data.page_elements,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// `SLIDE`, `MASTER`, `LAYOUT`, `NOTES` or `NOTES_MASTER`.
    pub fn page_type(&self) -> Option<&str> {
        self.page_type.as_deref()
    }

    /// Elements on the page, with groups flattened.
    pub fn elements(&self) -> Result<Vec<PageElement>> {
        load_elements(&self.elements)
    }

    pub fn get_element(&self, element_id: &str) -> Result<PageElement> {
        self.elements()?
            .into_iter()
            .find(|element| element.id() == element_id)
            .ok_or_else(|| Error::NotFound(format!("no element '{}' on page", element_id)))
    }
}

/// A presentation and its queue of pending batch updates.
#[derive(Debug)]
pub struct Presentation {
    data: PresentationData,
    queue: UpdateQueue,
    client: Option<SlidesClient>,
}

impl Presentation {
    pub fn from_existing(raw: Value, client: Option<SlidesClient>) -> Result<Self> {
        Ok(Self {
            data: bind(raw)?,
            queue: UpdateQueue::new(),
            client,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.data.presentation_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.data.title.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.data.locale.as_deref()
    }

    /// Page width and height.
    pub fn page_size(&self) -> Option<(Dimension, Dimension)> {
        let size = self.data.page_size.as_ref()?;
        Some((size.width.clone()?, size.height.clone()?))
    }

    pub fn slides(&self) -> Result<Vec<Page>> {
        pages(&self.data.slides)
    }

    pub fn masters(&self) -> Result<Vec<Page>> {
        pages(&self.data.masters)
    }

    pub fn layouts(&self) -> Result<Vec<Page>> {
        pages(&self.data.layouts)
    }

    /// Every element on every slide, in slide order.
    pub fn elements(&self) -> Result<Vec<PageElement>> {
        let mut elements = Vec::new();
        for slide in self.slides()? {
            elements.extend(slide.elements()?);
        }
        Ok(elements)
    }

    /// Find a slide, master or layout by id.
    pub fn get_page(&self, page_id: &str) -> Result<Page> {
        for raw in self
            .data
            .slides
            .iter()
            .chain(&self.data.masters)
            .chain(&self.data.layouts)
        {
            let page = Page::from_existing(raw.clone())?;
            if page.id() == Some(page_id) {
                return Ok(page);
            }
        }
        Err(Error::NotFound(format!("no page '{}'", page_id)))
    }

    pub fn get_element(&self, element_id: &str) -> Result<PageElement> {
        self.elements()?
            .into_iter()
            .find(|element| element.id() == element_id)
            .ok_or_else(|| Error::NotFound(format!("no element '{}'", element_id)))
    }

    pub fn pending(&self) -> &[Value] {
        self.queue.pending()
    }

    /// Queue a presentation-wide text replacement.
    pub fn replace_text(&mut self, find: &str, replace: &str, match_case: bool) -> Result<bool> {
        Ok(self.queue.add(requests::replace_all_text(find, replace, match_case)?))
    }

    /// Unique texts of shapes and table cells on the slides that match
    /// `pattern` from their start.
    pub fn find_matches(&self, pattern: &str) -> Result<BTreeSet<String>> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::InvalidArgument(format!("invalid pattern '{}': {}", pattern, e)))?;

        let matches: BTreeSet<String> = self
            .elements()?
            .iter()
            .flat_map(|element| element.matching_texts(&regex))
            .collect();
        debug!(count = matches.len(), "Found matching texts");

        Ok(matches)
    }

    /// Queue deletion of an element on any slide.
    pub fn delete_element(&mut self, element_id: &str) -> Result<bool> {
        let element = self.get_element(element_id)?;
        Ok(self.queue.add(element.delete_request()?))
    }
}

fn pages(raw: &[Value]) -> Result<Vec<Page>> {
    raw.iter().cloned().map(Page::from_existing).collect()
}

#[async_trait]
impl Deferred for Presentation {
    fn add_update(&mut self, update: Value) -> bool {
        if !requests::is_known_request(&update) {
            warn!(%update, "Rejected unknown Slides request");
            return false;
        }
        self.queue.add(update)
    }

    #[instrument(name = "Updating presentation", skip(self))]
    async fn update(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let client = self.client.as_ref().ok_or_else(|| {
            Error::InvalidArgument("presentation is not attached to a Slides client".to_string())
        })?;
        let id = self
            .data
            .presentation_id
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("presentation has no id".to_string()))?;

        self.queue.flush(client.api(), id).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use crate::slides::element::test_helpers::page_elements;
    use serde_json::{Value, json};

    pub(crate) fn mock_presentation() -> Value {
        json!({
            "presentationId": "pres1",
            "title": "Quarterly",
            "locale": "en",
            "pageSize": {
                "width": {"magnitude": 9144000, "unit": "EMU"},
                "height": {"magnitude": 5143500, "unit": "EMU"}
            },
            "slides": [
                {"objectId": "slide1", "pageType": "SLIDE", "pageElements": page_elements()},
                {"objectId": "slide2", "pageType": "SLIDE", "pageElements": [
                    {"objectId": "footer", "shape": {"shapeType": "TEXT_BOX",
                        "text": crate::slides::element::test_helpers::text("{{title}}")}}
                ]}
            ],
            "masters": [{"objectId": "master1", "pageType": "MASTER", "pageElements": []}],
            "layouts": [{"objectId": "layout1", "pageType": "LAYOUT"}]
        })
    }
}
