//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Answers questions from the podcast transcript collection and attributes each
//! answer to the episodes its context came from.

pub mod context;
mod response;
mod session;

pub use context::build_context;
pub use response::{RagResponse, Responder};
pub use session::{ChatMessage, ChatModel, ChatRole, ChatSession, OpenAIChat};

use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};

/// An episode cited as the source of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastEpisode {
    pub episode_name: String,
    pub episode_link: String,
    pub podcast_name: String,
}

impl From<&SearchResult> for PodcastEpisode {
    fn from(result: &SearchResult) -> Self {
        let metadata = &result.entry.metadata;
        Self {
            episode_name: metadata.episode_name.clone(),
            episode_link: metadata.episode_link.clone(),
            podcast_name: metadata.podcast_name.clone(),
        }
    }
}

/// Collapse retrieved chunks to their episodes, keyed by episode name, in first-seen order.
pub fn dedupe_episodes(results: &[SearchResult]) -> Vec<PodcastEpisode> {
    let mut episodes: Vec<PodcastEpisode> = Vec::new();
    for result in results {
        let name = &result.entry.metadata.episode_name;
        if !episodes.iter().any(|e| &e.episode_name == name) {
            episodes.push(PodcastEpisode::from(result));
        }
    }
    episodes
}

/// Format source episodes as blank-line separated attribution blocks.
pub fn format_sources(episodes: &[PodcastEpisode]) -> String {
    episodes
        .iter()
        .map(|episode| {
            format!(
                "Podcast Name: {}\nEpisode Name: {}\nEpisode Link: {}",
                episode.podcast_name, episode.episode_name, episode.episode_link
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
