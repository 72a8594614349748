//! Completion context definitions
//!
//! A context says what kind of candidates the word under the cursor needs. It
//! is derived from the walker's terminal state and the cursor word, and is
//! the only input the candidate generator dispatches on.

use crate::grammar::ValueCompletion;

/// What to complete at the cursor
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionContext {
    /// Complete flag tokens
    Flags {
        /// Prefix to filter flag tokens
        prefix: String,
    },

    /// Delegate to a value completer
    FlagValue {
        /// Flag name without the value marker
        flag: String,
        /// Annotation on the flag
        completion: ValueCompletion,
        /// Partial value typed so far
        partial: String,
        /// The value is typed inline after `flag=`
        inline: bool,
    },

    /// Complete subcommands, required positionals and required flags
    Commands {
        /// Prefix to filter candidates
        prefix: String,
    },

    /// No completion available
    None,
}

impl CompletionContext {
    /// Create a flag completion context
    pub fn flags(prefix: impl Into<String>) -> Self {
        Self::Flags {
            prefix: prefix.into(),
        }
    }

    /// Create a value completion context for a flag typed as `flag value`
    pub fn flag_value(
        flag: impl Into<String>,
        completion: ValueCompletion,
        partial: impl Into<String>,
    ) -> Self {
        Self::FlagValue {
            flag: flag.into(),
            completion,
            partial: partial.into(),
            inline: false,
        }
    }

    /// Create a value completion context for a flag typed as `flag=value`
    pub fn inline_flag_value(
        flag: impl Into<String>,
        completion: ValueCompletion,
        partial: impl Into<String>,
    ) -> Self {
        Self::FlagValue {
            flag: flag.into(),
            completion,
            partial: partial.into(),
            inline: true,
        }
    }

    /// Create a command completion context
    pub fn commands(prefix: impl Into<String>) -> Self {
        Self::Commands {
            prefix: prefix.into(),
        }
    }

    /// Whether a value completer handles this context
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::FlagValue { .. })
    }
}
