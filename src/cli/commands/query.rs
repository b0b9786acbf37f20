//! Interactive question loop.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result as PodragResult;
use crate::orchestrator::Orchestrator;
use crate::rag::{ChatSession, Responder};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    Reset,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Skip
    } else if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        Input::Quit
    } else if line.eq_ignore_ascii_case("reset") {
        Input::Reset
    } else {
        Input::Question(line)
    }
}

/// Run the interactive query loop.
pub async fn run_query(settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings.clone())?;
    let responder = orchestrator.responder()?;
    responder.check_compatibility().await?;

    println!("\n{}", style("podrag").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your podcasts, or 'quit' to leave. Use 'reset' to forget the conversation.").dim()
    );

    let mut session = ChatSession::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if let Err(e) = converse(stdin.lock(), &mut stdout, &responder, &mut session).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }
    Ok(())
}

/// Answer questions read line by line from `input` until quit or end of input.
///
/// A failed turn is reported and the loop moves on; fatal errors end the loop.
async fn converse<R, W>(
    mut input: R,
    out: &mut W,
    responder: &Responder,
    session: &mut ChatSession,
) -> PodragResult<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(out, "{} ", style("You:").green().bold())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let question = match classify(&line) {
            Input::Skip => continue,
            Input::Quit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            Input::Reset => {
                session.reset();
                writeln!(out, "Conversation history cleared.")?;
                continue;
            }
            Input::Question(question) => question,
        };

        let spinner = Output::spinner("Thinking...");
        let result = responder.respond(session, question).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                writeln!(out, "\n{} {}\n", style("Bot:").cyan().bold(), response.format_for_display())?;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                writeln!(out, "{} {}", style("Error:").red().bold(), e)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::error::PodragError;
    use crate::test_support::{HashEmbedder, ScriptedChat};
    use crate::vector_store::tests::entry;
    use crate::vector_store::{CollectionInfo, MemoryVectorStore, VectorStore};
    use std::io::Cursor;
    use std::sync::Arc;

    async fn responder_over(
        stored_dimensions: usize,
        chat: Arc<ScriptedChat>,
    ) -> Responder {
        let stored = HashEmbedder::new(stored_dimensions);
        let text = "galaxies telescopes and dark matter";
        let store = Arc::new(MemoryVectorStore::new());
        let info = CollectionInfo::new("podcasts", &stored.model_label(), stored.dimensions());
        store
            .replace_all(&info, &[entry(text, "E1", stored.embed(text).await.unwrap())])
            .await
            .unwrap();

        Responder::new(Arc::new(HashEmbedder::new(64)), store, chat)
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(classify("  \n"), Input::Skip);
        assert_eq!(classify("quit\n"), Input::Quit);
        assert_eq!(classify("EXIT"), Input::Quit);
        assert_eq!(classify("reset"), Input::Reset);
        assert_eq!(classify(" who hosts the show?\n"), Input::Question("who hosts the show?"));
    }

    #[tokio::test]
    async fn test_failed_turn_is_reported_and_loop_continues() {
        let chat = Arc::new(ScriptedChat::failing_once_then("Dark matter is everywhere."));
        let responder = responder_over(64, chat.clone()).await;
        let input = Cursor::new("dark matter galaxies\ntelescopes and galaxies\nquit\nnever read\n");
        let mut out = Vec::new();
        let mut session = ChatSession::new();

        converse(input, &mut out, &responder, &mut session).await.unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("scripted failure"));
        assert!(printed.contains("Response: Dark matter is everywhere."));
        assert!(printed.contains("Goodbye!"));
        assert_eq!(chat.calls().len(), 2);
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_ends_loop() {
        let chat = Arc::new(ScriptedChat::replying("unused"));
        let responder = responder_over(3, chat.clone()).await;
        let input = Cursor::new("dark matter\nsecond question\n");
        let mut out = Vec::new();
        let mut session = ChatSession::new();

        let err = converse(input, &mut out, &responder, &mut session).await.unwrap_err();

        assert!(matches!(err, PodragError::DimensionMismatch { expected: 3, actual: 64 }));
        assert!(chat.calls().is_empty());
        assert_eq!(String::from_utf8(out).unwrap().matches("You:").count(), 1);
    }

    #[tokio::test]
    async fn test_reset_and_end_of_input() {
        let chat = Arc::new(ScriptedChat::replying("Galaxies!"));
        let responder = responder_over(64, chat.clone()).await;
        let input = Cursor::new("galaxies\n\nreset\n");
        let mut out = Vec::new();
        let mut session = ChatSession::new();

        converse(input, &mut out, &responder, &mut session).await.unwrap();

        assert_eq!(chat.calls().len(), 1);
        assert!(session.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("Conversation history cleared."));
    }
}
