use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// A service endpoint that applies an ordered list of requests atomically.
#[async_trait]
pub trait BatchUpdate: Send + Sync {
    async fn batch_update(&self, id: &str, requests: &[Value]) -> Result<()>;
}

/// Update requests waiting for the next batch call.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    requests: Vec<Value>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request. Only JSON objects naming exactly one request kind
    /// are accepted.
    pub fn add(&mut self, update: Value) -> bool {
        match &update {
            Value::Object(map) if map.len() == 1 => {
                self.requests.push(update);
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> &[Value] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Send every queued request in one call. The queue is only cleared once
    /// the call succeeds.
    #[instrument(name = "Flushing updates", skip(self, target))]
    pub async fn flush<B>(&mut self, target: &B, id: &str) -> Result<usize>
    where
        B: BatchUpdate + ?Sized,
    {
        if self.requests.is_empty() {
            return Ok(0);
        }

        target.batch_update(id, &self.requests).await?;

        let sent = self.requests.len();
        self.requests.clear();
        debug!(sent, "Applied batch update");

        Ok(sent)
    }
}

/// A resource that owns an [`UpdateQueue`].
#[async_trait]
pub trait Deferred: Send {
    fn add_update(&mut self, update: Value) -> bool;

    /// Flush queued requests through the owning client.
    async fn update(&mut self) -> Result<()>;
}

/// Run `scope` against `resource`, then flush its queue whether or not the
/// scope succeeded.
///
/// An error from the scope takes precedence over a flush error.
pub async fn with_updates<R, T, F>(resource: &mut R, scope: F) -> Result<T>
where
    R: Deferred,
    F: FnOnce(&mut R) -> Result<T>,
{
    let outcome = scope(resource);
    let flushed = resource.update().await;

    match (outcome, flushed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(flush_err)) => {
            warn!(error = %flush_err, "Failed to flush updates after scope error");
            Err(e)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};

    /// Records every batch call; fails them while `fail` is set.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingBatch {
        pub calls: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
        pub fail: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl BatchUpdate for RecordingBatch {
        async fn batch_update(&self, id: &str, requests: &[Value]) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(Error::Upstream(google_sheets4::Error::Cancelled));
            }
            self.calls
                .lock()
                .unwrap()
                .push((id.to_string(), requests.to_vec()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::RecordingBatch;
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    struct Doc {
        batch: RecordingBatch,
        queue: UpdateQueue,
    }

    #[async_trait]
    impl Deferred for Doc {
        fn add_update(&mut self, update: Value) -> bool {
            self.queue.add(update)
        }

        async fn update(&mut self) -> Result<()> {
            self.queue.flush(&self.batch, "doc").await.map(|_| ())
        }
    }

    #[test]
    fn test_add_rejects_non_requests() {
        let mut queue = UpdateQueue::new();
        assert!(!queue.add(json!("deleteObject")));
        assert!(!queue.add(json!({})));
        assert!(!queue.add(json!({"a": {}, "b": {}})));
        assert!(queue.add(json!({"deleteObject": {"objectId": "x"}})));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_sends_once_in_order_and_clears() {
        let batch = RecordingBatch::default();
        let mut queue = UpdateQueue::new();
        let u1 = json!({"deleteObject": {"objectId": "one"}});
        let u2 = json!({"deleteObject": {"objectId": "two"}});
        queue.add(u1.clone());
        queue.add(u2.clone());

        let sent = queue.flush(&batch, "pres").await.unwrap();

        assert_eq!(sent, 2);
        assert!(queue.is_empty());
        let calls = batch.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("pres".to_string(), vec![u1, u2]));
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_updates() {
        let batch = RecordingBatch::default();
        *batch.fail.lock().unwrap() = true;
        let mut queue = UpdateQueue::new();
        queue.add(json!({"deleteObject": {"objectId": "one"}}));
        queue.add(json!({"deleteObject": {"objectId": "two"}}));

        let result = queue.flush(&batch, "pres").await;

        assert!(matches!(result, Err(Error::Upstream(_))));
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_flush_makes_no_call() {
        let batch = RecordingBatch::default();
        let mut queue = UpdateQueue::new();
        assert_eq!(queue.flush(&batch, "pres").await.unwrap(), 0);
        assert!(batch.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_updates_flushes_on_success() {
        let mut doc = Doc {
            batch: RecordingBatch::default(),
            queue: UpdateQueue::new(),
        };

        let value = with_updates(&mut doc, |d| {
            d.add_update(json!({"deleteObject": {"objectId": "a"}}));
            Ok(7)
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert!(doc.queue.is_empty());
        assert_eq!(doc.batch.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_with_updates_flushes_on_error() {
        let mut doc = Doc {
            batch: RecordingBatch::default(),
            queue: UpdateQueue::new(),
        };

        let result: Result<()> = with_updates(&mut doc, |d| {
            d.add_update(json!({"deleteObject": {"objectId": "a"}}));
            Err(Error::NotFound("element".to_string()))
        })
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(doc.batch.calls.lock().unwrap().len(), 1);
    }
}
