//! Scripted model runtime.

use async_stream::stream;
use async_trait::async_trait;
use brainstem_core::{ModelChunk, RuntimeError, RuntimeResult};
use brainstem_runtime::{ModelRuntime, ModelStream};
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone)]
struct Reply {
    chunks: Vec<ModelChunk>,
    failure: Option<String>,
}

/// Model runtime that replays queued replies, one per call.
///
/// Once the queue is empty every call streams a single empty text chunk.
#[derive(Debug, Default)]
pub struct ScriptedModelRuntime {
    replies: Mutex<VecDeque<Reply>>,
    payloads: Mutex<Vec<Value>>,
}

impl ScriptedModelRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply streamed as the given chunks.
    pub fn then(self, chunks: Vec<ModelChunk>) -> Self {
        self.push(Reply {
            chunks,
            failure: None,
        });
        self
    }

    /// Queue a plain text reply.
    pub fn then_text(self, content: impl Into<String>) -> Self {
        self.then(vec![ModelChunk::text(content)])
    }

    /// Queue a reply that fails after streaming the given chunks.
    pub fn then_fail(self, chunks: Vec<ModelChunk>, message: impl Into<String>) -> Self {
        self.push(Reply {
            chunks,
            failure: Some(message.into()),
        });
        self
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Payloads of every call so far.
    pub fn payloads(&self) -> Vec<Value> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ModelRuntime for ScriptedModelRuntime {
    async fn stream(&self, payload: &Value) -> RuntimeResult<ModelStream> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Reply {
                chunks: vec![ModelChunk::text("")],
                failure: None,
            });

        Ok(stream! {
            for chunk in reply.chunks {
                yield Ok(chunk);
            }
            if let Some(message) = reply.failure {
                yield Err(RuntimeError::ModelStream(message));
            }
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_in_order() {
        let model = ScriptedModelRuntime::new()
            .then(vec![ModelChunk::text("Hel"), ModelChunk::text("lo")])
            .then_text("second");

        let first: Vec<ModelChunk> = model
            .stream(&json!({ "n": 1 }))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        let second: Vec<ModelChunk> = model
            .stream(&json!({ "n": 2 }))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(second[0].content.as_deref(), Some("second"));
        assert_eq!(model.payloads(), vec![json!({ "n": 1 }), json!({ "n": 2 })]);
    }

    #[tokio::test]
    async fn test_failing_reply() {
        let model = ScriptedModelRuntime::new().then_fail(vec![ModelChunk::text("a")], "boom");
        let collected: Result<Vec<ModelChunk>, _> =
            model.stream(&json!({})).await.unwrap().try_collect().await;
        assert!(matches!(collected, Err(RuntimeError::ModelStream(m)) if m == "boom"));
    }
}
