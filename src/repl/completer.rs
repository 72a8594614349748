//! Completer for reedline - provides completion suggestions

use reedline::{Completer, Span, Suggestion};

use crate::completion::CompletionEngine;

/// Reedline completer over a [`CompletionEngine`]
///
/// The REPL line holds the program's arguments only; the program name is
/// put in front before the engine sees the line.
pub struct GrammarCompleter {
    engine: CompletionEngine,
    /// Program name plus the separating space
    head: String,
}

impl GrammarCompleter {
    pub fn new(engine: CompletionEngine) -> Self {
        let head = format!("{} ", engine.tree().node(engine.tree().root()).name());
        Self { engine, head }
    }
}

impl Completer for GrammarCompleter {
    /// Complete the input at the given cursor position
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let full = format!("{}{}", self.head, line);
        let (start, completions) = self.engine.complete_line(&full, self.head.len() + pos);
        let start = start.saturating_sub(self.head.len());

        completions
            .candidates
            .into_iter()
            .map(|candidate| Suggestion {
                value: candidate.value,
                span: Span::new(start, pos),
                append_whitespace: !candidate.no_space,
                ..Suggestion::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::DefaultValueCompleter;
    use crate::grammar::{CommandSpec, CommandTree, FlagSpec};
    use std::sync::Arc;

    fn create_test_completer() -> GrammarCompleter {
        let spec = CommandSpec::new("app")
            .flag(FlagSpec::value("output").short('o').inherited())
            .subcommand(CommandSpec::new("open"))
            .subcommand(CommandSpec::new("close"));
        let tree = Arc::new(CommandTree::build(&spec).unwrap());
        GrammarCompleter::new(CompletionEngine::new(
            tree,
            Arc::new(DefaultValueCompleter::new(".")),
        ))
    }

    #[test]
    fn test_complete_subcommand() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("op", 2);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "open");
        assert_eq!(suggestions[0].span.start, 0);
        assert_eq!(suggestions[0].span.end, 2);
        assert!(suggestions[0].append_whitespace);
    }

    #[test]
    fn test_flag_suggestions_keep_cursor_after_marker() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("close --o", 9);

        assert!(suggestions.iter().any(|s| s.value == "--output="));
        assert!(suggestions.iter().all(|s| !s.append_whitespace));
        for suggestion in suggestions {
            assert_eq!(suggestion.span.start, 6);
            assert_eq!(suggestion.span.end, 9);
        }
    }

    #[test]
    fn test_empty_line_lists_commands() {
        let mut completer = create_test_completer();
        let values: Vec<String> = completer.complete("", 0).into_iter().map(|s| s.value).collect();
        assert_eq!(values, vec!["open", "close"]);
    }
}
