//! Error handling for comptree.
//!
//! Completion resolution is infallible: the walker and candidate generator
//! always produce a (possibly empty) candidate set. The types here cover the
//! edges of the system:
//! - Grammar construction defects found while building the command tree
//! - Configuration loading and validation
//! - Value completer and custom handler failures
//!
//! # Example
//!
//! ```rust,no_run
//! use comptree::error::{ComptreeError, GrammarError, Result};
//!
//! fn load() -> Result<()> {
//!     Err(GrammarError::FileNotFound("app.toml".to_string()).into())
//! }
//!
//! if let Err(ComptreeError::Grammar(e)) = load() {
//!     eprintln!("{e}");
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{CompleterError, ComptreeError, ConfigError, GrammarError, Result};
