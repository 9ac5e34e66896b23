use super::{Page, Presentation, SlidesOperations};
use crate::auth::{Access, Authorizer};
use crate::config::{Credentials, scope_url};
use crate::error::{Error, Result};
use crate::updates::BatchUpdate;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/presentations";

const API_BASE_URL: &str = "https://slides.googleapis.com/v1";

/// Slides v1 over its REST endpoints.
pub struct GoogleSlides {
    client: Client,
    authorizer: Authorizer,
    access: Access,
    api_base_url: String,
}

impl GoogleSlides {
    #[instrument(name = "Connecting to Google Slides", skip_all)]
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let authorizer = Authorizer::from_credentials(credentials).await?;
        let access = authorizer.access(DEFAULT_SCOPE);
        let client = reqwest::ClientBuilder::new()
            .build()
            .map_err(|e| Error::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            authorizer,
            access,
            api_base_url: API_BASE_URL.to_string(),
        })
    }

    fn presentation_url(&self, presentation_id: &str) -> String {
        format!("{}/presentations/{}", self.api_base_url, presentation_id)
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = self.access.apply(request, &self.authorizer).await?.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to {}: {} - {}",
                action, status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl BatchUpdate for GoogleSlides {
    #[instrument(name = "Sending presentation batch update", skip_all, fields(presentation_id))]
    async fn batch_update(&self, presentation_id: &str, requests: &[Value]) -> Result<()> {
        let url = format!("{}:batchUpdate", self.presentation_url(presentation_id));
        let request = self
            .client
            .post(&url)
            .json(&json!({"requests": requests}));

        self.send(request, "update presentation").await?;
        Ok(())
    }
}

#[async_trait]
impl SlidesOperations for GoogleSlides {
    #[instrument(name = "Fetching presentation payload", skip_all, fields(presentation_id))]
    async fn get_presentation(&self, presentation_id: &str) -> Result<Value> {
        let request = self.client.get(self.presentation_url(presentation_id));
        let response = self.send(request, "get presentation").await?;
        Ok(response.json().await?)
    }

    #[instrument(name = "Fetching page payload", skip_all, fields(presentation_id, page_id))]
    async fn get_page(&self, presentation_id: &str, page_id: &str) -> Result<Value> {
        let url = format!("{}/pages/{}", self.presentation_url(presentation_id), page_id);
        let response = self.send(self.client.get(&url), "get page").await?;
        Ok(response.json().await?)
    }
}

/// Slides facade returning [`Presentation`] and [`Page`] objects.
#[derive(Clone)]
pub struct SlidesClient {
    api: Arc<dyn SlidesOperations>,
}

impl fmt::Debug for SlidesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidesClient").finish_non_exhaustive()
    }
}

impl SlidesClient {
    pub fn new(api: impl SlidesOperations + 'static) -> Self {
        Self { api: Arc::new(api) }
    }

    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        Ok(Self::new(GoogleSlides::connect(credentials).await?))
    }

    pub async fn from_api_key(api_key: &str) -> Result<Self> {
        Self::connect(&Credentials::ApiKey(api_key.to_string())).await
    }

    pub async fn from_service_account(
        key_path: impl Into<PathBuf>,
        delegated_user: Option<&str>,
        scopes: &[&str],
    ) -> Result<Self> {
        Self::connect(&Credentials::ServiceAccount {
            key_path: key_path.into(),
            delegated_user: delegated_user.map(str::to_string),
            scopes: scopes.iter().map(|s| scope_url(s)).collect(),
        })
        .await
    }

    pub(crate) fn api(&self) -> &dyn SlidesOperations {
        self.api.as_ref()
    }

    #[instrument(name = "Fetching presentation", skip(self))]
    pub async fn get_presentation(&self, presentation_id: &str) -> Result<Presentation> {
        let raw = self.api.get_presentation(presentation_id).await?;
        Presentation::from_existing(raw, Some(self.clone()))
    }

    /// A single page. Pages fetched this way are read-only.
    #[instrument(name = "Fetching page", skip(self))]
    pub async fn get_page(&self, presentation_id: &str, page_id: &str) -> Result<Page> {
        let raw = self.api.get_page(presentation_id, page_id).await?;
        Page::from_existing(raw)
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use crate::error::Error;
    use crate::slides::presentation::test_helpers::mock_presentation;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    pub(crate) struct MockSlides {
        pub batches: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
        pub fail_batch: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl BatchUpdate for MockSlides {
        async fn batch_update(&self, id: &str, requests: &[Value]) -> Result<()> {
            if *self.fail_batch.lock().unwrap() {
                return Err(Error::Api("Failed to update presentation: 500".to_string()));
            }
            self.batches
                .lock()
                .unwrap()
                .push((id.to_string(), requests.to_vec()));
            Ok(())
        }
    }

    #[async_trait]
    impl SlidesOperations for MockSlides {
        async fn get_presentation(&self, _presentation_id: &str) -> Result<Value> {
            Ok(mock_presentation())
        }

        async fn get_page(&self, _presentation_id: &str, page_id: &str) -> Result<Value> {
            let presentation = mock_presentation();
            presentation["slides"]
                .as_array()
                .into_iter()
                .flatten()
                .find(|page| page["objectId"] == page_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(page_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::MockSlides;
    use super::*;
    use crate::error::Error;
    use crate::updates::{Deferred, with_updates};

    #[tokio::test]
    async fn test_rest_urls() {
        let slides = GoogleSlides::connect(&Credentials::ApiKey("k".to_string()))
            .await
            .unwrap();
        assert_eq!(
            slides.presentation_url("pres1"),
            "https://slides.googleapis.com/v1/presentations/pres1"
        );
    }

    #[tokio::test]
    async fn test_get_presentation() {
        let client = SlidesClient::new(MockSlides::default());
        let presentation = client.get_presentation("pres1").await.unwrap();

        assert_eq!(presentation.id(), Some("pres1"));
        assert_eq!(presentation.slides().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_page() {
        let client = SlidesClient::new(MockSlides::default());
        let page = client.get_page("pres1", "slide2").await.unwrap();

        assert_eq!(page.id(), Some("slide2"));
        assert_eq!(page.elements().unwrap()[0].id(), "footer");
    }

    #[tokio::test]
    async fn test_replace_matches_in_one_batch() {
        let mock = MockSlides::default();
        let client = SlidesClient::new(mock.clone());
        let mut presentation = client.get_presentation("pres1").await.unwrap();

        let replaced = with_updates(&mut presentation, |p| {
            let tags = p.find_matches(r"\{\{\w+\}\}")?;
            for (i, tag) in tags.iter().enumerate() {
                p.replace_text(tag, &i.to_string(), false)?;
            }
            Ok(tags.len())
        })
        .await
        .unwrap();

        assert_eq!(replaced, 2);
        let batches = mock.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, "pres1");
        assert_eq!(batches[0].1.len(), 2);
        assert_eq!(batches[0].1[0]["replaceAllText"]["replaceText"], "0");
    }

    #[tokio::test]
    async fn test_failed_update_keeps_queue() {
        let mock = MockSlides::default();
        *mock.fail_batch.lock().unwrap() = true;
        let client = SlidesClient::new(mock.clone());
        let mut presentation = client.get_presentation("pres1").await.unwrap();

        presentation.delete_element("footer").unwrap();
        assert!(matches!(
            presentation.update().await,
            Err(Error::Api(_))
        ));
        assert_eq!(presentation.pending().len(), 1);
        assert!(mock.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_element_edits_go_through_queue() {
        let mock = MockSlides::default();
        let client = SlidesClient::new(mock.clone());
        let mut presentation = client.get_presentation("pres1").await.unwrap();

        let footer = presentation.get_element("footer").unwrap();
        for request in footer.as_shape().unwrap().set_text_requests("Page 2").unwrap() {
            assert!(presentation.add_update(request));
        }
        presentation.update().await.unwrap();

        let batches = mock.batches.lock().unwrap();
        assert_eq!(batches[0].1.len(), 2);
        assert_eq!(batches[0].1[1]["insertText"]["objectId"], "footer");
    }
}
