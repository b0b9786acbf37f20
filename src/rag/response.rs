//! RAG response generation.

use super::{build_context, dedupe_episodes, format_sources, ChatModel, ChatSession, PodcastEpisode};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{PodragError, Result};
use crate::vector_store::{check_dimensions, has_relevant_match, SearchResult, VectorStore, RELEVANCE_THRESHOLD};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 6;

/// Answers questions from the transcript collection.
pub struct Responder {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
    prompts: Prompts,
    top_k: usize,
    min_relevance: f32,
}

impl Responder {
    /// Create a new responder.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            chat,
            prompts: Prompts::default(),
            top_k: DEFAULT_TOP_K,
            min_relevance: RELEVANCE_THRESHOLD,
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the best-score threshold below which nothing is answered.
    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    /// Fail before the first question when the collection and the active
    /// embedding model disagree on vector dimension.
    pub async fn check_compatibility(&self) -> Result<()> {
        match self.vector_store.collection_info().await? {
            Some(info) => {
                if info.model != self.embedder.model_label() {
                    warn!(
                        "Collection was built with {} but the active model is {}",
                        info.model,
                        self.embedder.model_label()
                    );
                }
                check_dimensions(&info, self.embedder.dimensions())
            }
            None => {
                warn!("Collection has not been built yet; every question will go unanswered");
                Ok(())
            }
        }
    }

    /// Ranked retrieval without answer generation.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.vector_store.query(&query_embedding, k).await
    }

    /// Answer a question in the context of `session`.
    ///
    /// Unanswerable questions leave the session untouched.
    #[instrument(skip(self, session), fields(question = %question))]
    pub async fn respond(&self, session: &mut ChatSession, question: &str) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PodragError::InvalidInput("Question is empty".to_string()));
        }

        info!("Processing question: {}", question);
        let results = self.search(question, self.top_k).await?;

        if !has_relevant_match(&results, self.min_relevance) {
            debug!(
                "Best score {:?} below threshold {}",
                results.first().map(|r| r.score),
                self.min_relevance
            );
            return Ok(RagResponse::no_match(&self.prompts.rag.no_match));
        }

        let context = build_context(&results);
        let sources = dedupe_episodes(&results);
        let prompt = self.prompts.answer_prompt(&context, question);

        let answer = self.chat.complete(&session.messages_with(&prompt)).await?;
        session.record(prompt, answer.clone());

        debug!("Generated response with {} sources", sources.len());

        Ok(RagResponse {
            answer,
            sources,
            matched: true,
        })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, PartialEq)]
pub struct RagResponse {
    /// The generated answer, or the fixed no-match reply.
    pub answer: String,
    /// Episodes the context came from, each once.
    pub sources: Vec<PodcastEpisode>,
    /// Whether retrieval found relevant context.
    pub matched: bool,
}

impl RagResponse {
    fn no_match(message: &str) -> Self {
        Self {
            answer: message.to_string(),
            sources: Vec::new(),
            matched: false,
        }
    }

    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        if !self.matched {
            return self.answer.clone();
        }
        format!("Response: {}\nSources: {}", self.answer, format_sources(&self.sources))
    }
}
