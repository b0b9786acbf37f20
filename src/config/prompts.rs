//! Prompt templates for podrag.
//!
//! The answer prompt can be customized by placing a `rag.toml` in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
}

/// Prompts for retrieval-augmented answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Template with `{{context}}` and `{{question}}` placeholders.
    pub user: String,
    /// Fixed reply when nothing relevant was retrieved.
    pub no_match: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            user: r#"
You are a friendly chatbot who answers questions based on the following context only.
If the context has an Episode Name, summarize the episode. Otherwise answer the question.
If you are summarizing, limit the response to 250 words. Otherwise don't worry about word limit.
Use a playful tone

{{context}}

---

Answer the question based on the above context: {{question}}
"#
            .to_string(),
            no_match: "Unable to find matching results.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults from `rag.toml` in `custom_dir` when present.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render the answer prompt for a context block and question.
    pub fn answer_prompt(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        Self::render(&self.rag.user, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_answer_prompt_instructions() {
        let prompts = Prompts::default();
        let prompt = prompts.answer_prompt("CTX", "What happened?");

        assert!(prompt.contains("based on the following context only"));
        assert!(prompt.contains("limit the response to 250 words"));
        assert!(prompt.contains("playful tone"));
        assert!(prompt.contains("CTX\n\n---\n\nAnswer the question based on the above context: What happened?"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_custom_prompt_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "user = \"Q: {{question}} C: {{context}}\"\nno_match = \"Nothing here.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        assert_eq!(prompts.answer_prompt("c", "q"), "Q: q C: c");
        assert_eq!(prompts.rag.no_match, "Nothing here.");
    }
}
