//! Deterministic doubles for the embedding and chat seams.

use crate::embedding::Embedder;
use crate::error::{PodragError, Result};
use crate::rag::{ChatMessage, ChatModel};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

/// Bag-of-words embedder: each lowercase token is hashed into a bucket, then the
/// vector is L2-normalised. Identical word multisets give identical vectors.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_label(&self) -> String {
        format!("test:hash-{}", self.dimensions)
    }
}

/// Chat model that returns a canned reply and records what it was sent.
pub struct ScriptedChat {
    reply: Option<String>,
    failures_left: Mutex<usize>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            failures_left: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A chat model whose every call fails.
    pub fn failing() -> Self {
        Self {
            reply: None,
            failures_left: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first call, then replies with `reply`.
    pub fn failing_once_then(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            failures_left: Mutex::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let mut failures_left = self.failures_left.lock().unwrap();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(PodragError::Chat("scripted failure".to_string()));
        }

        self.reply
            .clone()
            .ok_or_else(|| PodragError::Chat("scripted failure".to_string()))
    }
}
