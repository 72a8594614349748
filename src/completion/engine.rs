//! Completion engine - orchestrates the completion flow
//!
//! This module ties the completion components together: the walk over the
//! typed words, the context decision for the cursor word, and candidate
//! generation with its fallback chain.

use std::sync::Arc;

use serde::Serialize;

use super::context::CompletionContext;
use super::provider::{
    CompletionHook, DefaultValueCompleter, HandlerHook, HandlerRegistry, HookContext,
    ValueCompleter,
};
use super::token_stream::TokenStream;
use super::walker::WalkerState;
use crate::config::CompletionConfig;
use crate::error::Result;
use crate::grammar::{CommandTree, GrammarFile, VALUE_MARKER};

/// One completion request
///
/// `words` are the words after the program name; `words[cursor]` is the word
/// being completed (missing means empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    words: Vec<String>,
    cursor: usize,
}

impl CompletionRequest {
    /// Request completing `current` after the words in `typed`
    pub fn new<I, S>(typed: I, current: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = typed.into_iter().map(Into::into).collect();
        let cursor = words.len();
        words.push(current.into());
        Self { words, cursor }
    }

    /// Request from shell words that start with the program name
    ///
    /// Returns `None` when the cursor is on the program name itself.
    pub fn from_shell_words(words: &[String], cword: usize) -> Option<Self> {
        if cword == 0 || words.is_empty() {
            return None;
        }
        let words = words[1..].to_vec();
        let cursor = (cword - 1).min(words.len());
        Some(Self { words, cursor })
    }

    /// Words before the cursor word
    pub fn typed(&self) -> &[String] {
        &self.words[..self.cursor]
    }

    /// The word being completed
    pub fn current(&self) -> &str {
        self.words.get(self.cursor).map(String::as_str).unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// A completion suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub value: String,
    /// The shell should not add a separator after inserting the value
    pub no_space: bool,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let no_space = value.ends_with(VALUE_MARKER) || value.ends_with('/');
        Self { value, no_space }
    }
}

/// Result of one completion request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Completions {
    pub candidates: Vec<Candidate>,
    /// `flag=` text that stays in front of inline value candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_prefix: Option<String>,
}

impl Completions {
    fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: values.into_iter().map(Candidate::new).collect(),
            inline_prefix: None,
        }
    }

    /// Candidate values in order
    pub fn values(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Main completion engine
#[derive(Clone)]
pub struct CompletionEngine {
    tree: Arc<CommandTree>,
    /// Completer for annotated flag values
    completer: Arc<dyn ValueCompleter>,
    /// Root command's last-resort hook
    hook: Option<Arc<dyn CompletionHook>>,
}

impl CompletionEngine {
    /// Create a new completion engine
    ///
    /// # Arguments
    /// * `tree` - The frozen command grammar
    /// * `completer` - Completer for annotated flag values
    pub fn new(tree: Arc<CommandTree>, completer: Arc<dyn ValueCompleter>) -> Self {
        Self {
            tree,
            completer,
            hook: None,
        }
    }

    /// Set the custom completion hook
    pub fn with_hook(mut self, hook: Arc<dyn CompletionHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Build an engine for a grammar file with the default collaborators
    ///
    /// Filesystem completions resolve against the working directory.
    pub fn from_grammar(grammar: &GrammarFile, config: &CompletionConfig) -> Result<Self> {
        let tree = Arc::new(CommandTree::build(&grammar.command)?);
        let handlers = HandlerRegistry::from_specs(&grammar.handlers);
        let completer = DefaultValueCompleter::current_dir()?
            .with_hidden_files(config.show_hidden_files)
            .with_handlers(handlers.clone());

        let engine = Self::new(tree, Arc::new(completer));
        Ok(match &grammar.custom_hook {
            Some(name) => engine.with_hook(Arc::new(HandlerHook::new(handlers, name.clone()))),
            None => engine,
        })
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Walk the typed words of `request`
    pub fn walk(&self, request: &CompletionRequest) -> WalkerState {
        WalkerState::run(&self.tree, request.typed())
    }

    /// Candidates for the cursor word of `request`
    pub fn complete(&self, request: &CompletionRequest) -> Completions {
        let state = self.walk(request);
        let context = state.to_context(&self.tree, request.current());
        tracing::debug!(?context, "completion context");

        let completions = self.fetch_candidates(&context, &state, request);
        tracing::debug!(count = completions.len(), "completion candidates");
        completions
    }

    /// Complete a raw line at byte position `pos`
    ///
    /// The first word is the program name. Returns where the candidates
    /// replace the line, and the candidates; inline value candidates replace
    /// only the text after `flag=`.
    pub fn complete_line(&self, line: &str, pos: usize) -> (usize, Completions) {
        let stream = TokenStream::parse(line, pos);
        let start = stream.completion_start();
        if stream.word_index == 0 {
            return (start, Completions::default());
        }

        let typed = stream.words_before_cursor()[1..]
            .iter()
            .map(|w| w.text.clone());
        let request = CompletionRequest::new(typed, stream.current_prefix());
        let completions = self.complete(&request);

        let start = if completions.inline_prefix.is_some() {
            stream.value_start().unwrap_or(stream.cursor)
        } else {
            start
        };
        (start, completions)
    }

    /// Fetch candidates based on completion context
    fn fetch_candidates(
        &self,
        context: &CompletionContext,
        state: &WalkerState,
        request: &CompletionRequest,
    ) -> Completions {
        match context {
            CompletionContext::Flags { prefix } => {
                let base = if state.required_flags.is_empty() {
                    self.tree.node(state.node).flags().all_tokens()
                } else {
                    state.required_flags.as_slice()
                };
                Completions::from_values(
                    base.iter()
                        .filter(|t| t.starts_with(prefix.as_str()))
                        .cloned(),
                )
            }
            CompletionContext::FlagValue {
                flag,
                completion,
                partial,
                inline,
            } => match self.completer.complete(completion, partial) {
                Ok(values) => Completions {
                    inline_prefix: inline.then(|| format!("{flag}{VALUE_MARKER}")),
                    ..Completions::from_values(values)
                },
                Err(e) => {
                    tracing::warn!(flag = %flag, error = %e, "value completer failed");
                    self.command_candidates(state, request)
                }
            },
            CompletionContext::Commands { .. } => self.command_candidates(state, request),
            CompletionContext::None => Completions::default(),
        }
    }

    /// Children, required positionals and required flags, then the positional
    /// aliases, then the hook
    fn command_candidates(&self, state: &WalkerState, request: &CompletionRequest) -> Completions {
        let node = self.tree.node(state.node);
        let current = request.current();

        let children = node
            .children()
            .iter()
            .filter(|_| !state.subcommands_suppressed)
            .map(|&child| self.tree.node(child).name());
        let mut values: Vec<&str> = Vec::new();
        for value in children
            .chain(state.required_positionals.iter().map(String::as_str))
            .chain(state.required_flags.iter().map(String::as_str))
        {
            if value.starts_with(current) && !values.contains(&value) {
                values.push(value);
            }
        }

        if values.is_empty() && !state.required_positionals.is_empty() {
            values.extend(
                node.positional_aliases()
                    .iter()
                    .map(String::as_str)
                    .filter(|a| a.starts_with(current)),
            );
        }
        if !values.is_empty() {
            return Completions::from_values(values);
        }

        self.hook_candidates(state, request)
    }

    fn hook_candidates(&self, state: &WalkerState, request: &CompletionRequest) -> Completions {
        let Some(hook) = &self.hook else {
            return Completions::default();
        };
        let context = HookContext {
            node: state.node,
            command_path: self.tree.path(state.node),
            words: request.typed(),
            current: request.current(),
        };
        match hook.complete(&context) {
            Ok(values) => Completions::from_values(values),
            Err(e) => {
                tracing::warn!(command = %context.command_path, error = %e, "completion hook failed");
                Completions::default()
            }
        }
    }
}

impl std::fmt::Debug for CompletionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionEngine")
            .field("commands", &self.tree.len())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompleterError;
    use crate::grammar::{CommandSpec, FlagSpec, ValueCompletion};

    struct FixedCompleter(Vec<&'static str>);

    impl ValueCompleter for FixedCompleter {
        fn complete(&self, _: &ValueCompletion, partial: &str) -> Result<Vec<String>> {
            Ok(self
                .0
                .iter()
                .filter(|v| v.starts_with(partial))
                .map(|v| v.to_string())
                .collect())
        }
    }

    struct BrokenCompleter;

    impl ValueCompleter for BrokenCompleter {
        fn complete(&self, _: &ValueCompletion, _: &str) -> Result<Vec<String>> {
            Err(CompleterError::HandlerFailed {
                handler: "broken".to_string(),
                message: "boom".to_string(),
            }
            .into())
        }
    }

    fn spec() -> CommandSpec {
        CommandSpec::new("app")
            .flag(FlagSpec::boolean("verbose").short('v').inherited())
            .flag(
                FlagSpec::value("config")
                    .inherited()
                    .completion(ValueCompletion::custom("configs")),
            )
            .subcommand(
                CommandSpec::new("open").flag(
                    FlagSpec::value("file")
                        .short('f')
                        .completion(ValueCompletion::filenames(["txt"])),
                ),
            )
            .subcommand(CommandSpec::new("close"))
    }

    fn engine(completer: impl ValueCompleter + 'static) -> CompletionEngine {
        let tree = Arc::new(CommandTree::build(&spec()).unwrap());
        CompletionEngine::new(tree, Arc::new(completer))
    }

    #[test]
    fn test_request_accessors() {
        let request = CompletionRequest::new(["open", "--file"], "no");
        assert_eq!(request.typed(), ["open", "--file"]);
        assert_eq!(request.current(), "no");
        assert_eq!(request.cursor(), 2);
    }

    #[test]
    fn test_request_from_shell_words() {
        let words: Vec<String> = ["app", "open", "--f"].iter().map(|w| w.to_string()).collect();
        let request = CompletionRequest::from_shell_words(&words, 2).unwrap();
        assert_eq!(request.typed(), ["open"]);
        assert_eq!(request.current(), "--f");

        // cursor past the last word completes an empty word
        let request = CompletionRequest::from_shell_words(&words, 3).unwrap();
        assert_eq!(request.typed(), ["open", "--f"]);
        assert_eq!(request.current(), "");

        assert!(CompletionRequest::from_shell_words(&words, 0).is_none());
    }

    #[test]
    fn test_flag_tokens_tagged_no_space() {
        let engine = engine(FixedCompleter(vec![]));
        let got = engine.complete(&CompletionRequest::new(["open"], "-"));
        assert_eq!(
            got.values(),
            vec!["--config=", "--file=", "-f=", "--verbose", "-v"]
        );
        assert!(got.candidates[0].no_space);
        assert!(!got.candidates[3].no_space);
    }

    #[test]
    fn test_inline_value_carries_prefix() {
        let engine = engine(FixedCompleter(vec!["notes.txt", "todo.txt"]));
        let got = engine.complete(&CompletionRequest::new(["open"], "--file=n"));
        assert_eq!(got.values(), vec!["notes.txt"]);
        assert_eq!(got.inline_prefix.as_deref(), Some("--file="));
    }

    #[test]
    fn test_failing_completer_falls_back_to_commands() {
        let engine = engine(BrokenCompleter);
        let got = engine.complete(&CompletionRequest::new(["--config"], ""));
        assert_eq!(got.values(), vec!["open", "close"]);

        let got = engine.complete(&CompletionRequest::new(["open", "-f"], ""));
        assert!(got.is_empty());
    }

    #[test]
    fn test_complete_line_positions() {
        let engine = engine(FixedCompleter(vec!["notes.txt"]));

        let (start, got) = engine.complete_line("app op", 6);
        assert_eq!(start, 4);
        assert_eq!(got.values(), vec!["open"]);

        let (start, got) = engine.complete_line("app open --file=no", 18);
        assert_eq!(start, 16);
        assert_eq!(got.values(), vec!["notes.txt"]);

        // completing the program name offers nothing
        let (start, got) = engine.complete_line("ap", 2);
        assert_eq!(start, 0);
        assert!(got.is_empty());
    }

    #[test]
    fn test_candidates_serialize() {
        let got = Completions::from_values(["--file="]);
        let json = serde_json::to_string(&got).unwrap();
        assert_eq!(json, r#"{"candidates":[{"value":"--file=","no_space":true}]}"#);
    }
}
