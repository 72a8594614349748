//! Completion resolution
//!
//! Given a frozen [`CommandTree`](crate::grammar::CommandTree) and the words
//! typed so far, this module decides what to offer for the word under the
//! cursor.
//!
//! # Architecture
//!
//! - **TokenStream**: splits a raw line into shell words with cursor awareness
//! - **Walker**: consumes the typed words and descends the tree, tracking
//!   required flags and positionals, bound flag values and suppression
//! - **Context**: what the cursor word needs (flags, a flag value, commands)
//! - **Provider**: value completers and the custom hook
//! - **Engine**: orchestrates the flow and applies the fallback chain
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use comptree::completion::{CompletionEngine, CompletionRequest, DefaultValueCompleter};
//! use comptree::grammar::{CommandSpec, CommandTree, FlagSpec};
//!
//! let spec = CommandSpec::new("app")
//!     .flag(FlagSpec::boolean("verbose"))
//!     .subcommand(CommandSpec::new("open"))
//!     .subcommand(CommandSpec::new("close"));
//! let tree = Arc::new(CommandTree::build(&spec).unwrap());
//! let engine = CompletionEngine::new(tree, Arc::new(DefaultValueCompleter::new(".")));
//!
//! let completions = engine.complete(&CompletionRequest::new(Vec::<String>::new(), "o"));
//! assert_eq!(completions.values(), vec!["open"]);
//! ```

mod context;
mod engine;
mod provider;
mod token_stream;
mod walker;

#[cfg(test)]
mod tests;

pub use context::CompletionContext;
pub use engine::{Candidate, CompletionEngine, CompletionRequest, Completions};
pub use provider::{
    CompletionHook, CustomHandler, DefaultValueCompleter, ExternalCommandHandler, HandlerHook,
    HandlerRegistry, HandlerRequest, HookContext, ValueCompleter, WordListHandler,
};
pub use token_stream::{TokenStream, Word};
pub use walker::WalkerState;
