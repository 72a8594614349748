//! comptree library
//!
//! Completion resolution for a partially typed command line, driven by a
//! static grammar of commands, flags and positional arguments. Shells call
//! into it through the `comptree` binary; other front-ends can embed the
//! [`CompletionEngine`] directly.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `completion`: Token walker, completion contexts and candidate generation
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `grammar`: Grammar model, flag classification and the command tree
//! - `repl`: Interactive shell for trying a grammar
//!
//! # Example
//!
//! ```
//! use comptree::{CommandSpec, CommandTree, CompletionEngine, CompletionRequest, FlagSpec};
//! use comptree::completion::DefaultValueCompleter;
//! use std::sync::Arc;
//!
//! let spec = CommandSpec::new("app")
//!     .flag(FlagSpec::boolean("verbose").short('v').inherited())
//!     .subcommand(CommandSpec::new("status"));
//! let tree = Arc::new(CommandTree::build(&spec)?);
//! let engine = CompletionEngine::new(tree, Arc::new(DefaultValueCompleter::new(".")));
//!
//! let completions = engine.complete(&CompletionRequest::new(Vec::<String>::new(), "st"));
//! assert_eq!(completions.values(), vec!["status"]);
//! # Ok::<(), comptree::ComptreeError>(())
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod grammar;
pub mod repl;

// Re-export commonly used types
pub use completion::{
    Candidate, CompletionContext, CompletionEngine, CompletionRequest, Completions, WalkerState,
};
pub use config::Config;
pub use error::{ComptreeError, Result};
pub use grammar::{CommandSpec, CommandTree, FlagSpec, GrammarFile, ValueCompletion};
pub use repl::ReplEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
