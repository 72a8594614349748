//! Token walker
//!
//! The walker consumes the words typed before the cursor word, left to
//! right, descending the command tree as subcommand names go by. Each step
//! takes the current [`WalkerState`] by value and returns the next one,
//! together with how many words it consumed. The walk never fails: a word
//! that is neither a flag nor a subcommand is a positional.

use std::collections::BTreeMap;

use super::context::CompletionContext;
use crate::grammar::{CommandTree, FLAG_MARKER, NodeId, VALUE_MARKER, flag_name, split_flag_word};

/// Per-request state of the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerState {
    /// Command the walk has descended to
    pub node: NodeId,
    /// Unsatisfied required flag tokens; cleared when any member is seen
    pub required_flags: Vec<String>,
    /// Unsatisfied required positionals; cleared when any member is seen
    pub required_positionals: Vec<String>,
    /// A local flag of the current command was seen
    pub subcommands_suppressed: bool,
    /// Value-taking flag whose value is the cursor word
    pub pending_flag: Option<String>,
    /// Flag values seen so far, across commands
    pub flag_values: BTreeMap<String, String>,
    /// Positional words seen so far, across commands
    pub nouns: Vec<String>,
}

impl WalkerState {
    /// Fresh state positioned at `node`
    pub fn at(tree: &CommandTree, node: NodeId) -> Self {
        let command = tree.node(node);
        Self {
            node,
            required_flags: command.flags().required_tokens().to_vec(),
            required_positionals: command.required_positionals().to_vec(),
            subcommands_suppressed: false,
            pending_flag: None,
            flag_values: BTreeMap::new(),
            nouns: Vec::new(),
        }
    }

    /// Walk all of `typed` starting at the root
    pub fn run(tree: &CommandTree, typed: &[String]) -> Self {
        let mut state = Self::at(tree, tree.root());
        let mut index = 0;

        while index < typed.len() {
            let (next, consumed) = state.next(tree, typed, index);
            state = next;
            index += consumed;
        }

        tracing::debug!(
            command = %tree.path(state.node),
            required_flags = state.required_flags.len(),
            required_positionals = state.required_positionals.len(),
            suppressed = state.subcommands_suppressed,
            pending = ?state.pending_flag,
            "walk finished"
        );
        state
    }

    /// Consume the word at `index`, returning the next state and the number
    /// of words consumed
    pub fn next(self, tree: &CommandTree, typed: &[String], index: usize) -> (Self, usize) {
        let word = typed[index].as_str();

        if word.starts_with(FLAG_MARKER) {
            return self.on_flag(tree, typed, index);
        }
        // a local flag closes the node to descent; child names become nouns
        let child = (!self.subcommands_suppressed)
            .then(|| tree.resolve_child(self.node, word))
            .flatten();
        if let Some(child) = child {
            tracing::trace!(word, command = %tree.path(child), "descend");
            return (self.descend(tree, child), 1);
        }
        (self.on_positional(tree, word), 1)
    }

    fn on_flag(mut self, tree: &CommandTree, typed: &[String], index: usize) -> (Self, usize) {
        let flags = tree.node(self.node).flags();
        let (name, inline) = split_flag_word(&typed[index]);

        if self.required_flags.iter().any(|token| flag_name(token) == name) {
            self.required_flags.clear();
        }
        if flags.is_local_only(name) {
            self.subcommands_suppressed = true;
        }

        let two_words = inline.is_none() && flags.takes_separate_value(name);
        let next_word = typed.get(index + 1).filter(|_| two_words);

        match (inline, next_word) {
            (Some(value), _) => {
                self.flag_values.insert(name.to_string(), value.to_string());
            }
            (None, Some(value)) => {
                self.flag_values.insert(name.to_string(), value.clone());
            }
            (None, None) if two_words => {}
            (None, None) => {
                self.flag_values.insert(name.to_string(), "true".to_string());
            }
        }

        if !two_words {
            return (self, 1);
        }
        if next_word.is_none() {
            tracing::trace!(flag = name, "flag value is the cursor word");
            self.pending_flag = Some(name.to_string());
        }
        (self, 2)
    }

    fn on_positional(mut self, tree: &CommandTree, word: &str) -> Self {
        let command = tree.node(self.node);
        let satisfies = self.required_positionals.iter().any(|p| p == word)
            || command.positional_aliases().iter().any(|p| p == word);
        if satisfies {
            self.required_positionals.clear();
        }
        self.nouns.push(word.to_string());
        self
    }

    /// Move to `child`; requirements and suppression restart from its own
    /// declarations
    fn descend(self, tree: &CommandTree, child: NodeId) -> Self {
        Self {
            flag_values: self.flag_values,
            nouns: self.nouns,
            ..Self::at(tree, child)
        }
    }

    /// Decide what the cursor word needs
    pub fn to_context(&self, tree: &CommandTree, current: &str) -> CompletionContext {
        let flags = tree.node(self.node).flags();

        if current.starts_with(FLAG_MARKER) {
            if !current.contains(VALUE_MARKER) {
                return CompletionContext::flags(current);
            }
            let (name, partial) = split_flag_word(current);
            return match flags.value_completion(name) {
                Some(completion) => CompletionContext::inline_flag_value(
                    name,
                    completion.clone(),
                    partial.unwrap_or_default(),
                ),
                None => CompletionContext::None,
            };
        }

        if let Some(pending) = &self.pending_flag {
            return match flags.value_completion(pending) {
                Some(completion) => {
                    CompletionContext::flag_value(pending.as_str(), completion.clone(), current)
                }
                None => CompletionContext::None,
            };
        }

        CompletionContext::commands(current)
    }
}
