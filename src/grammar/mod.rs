//! Command grammar: registrations, the frozen tree, and flag classification
//!
//! A grammar starts as a [`CommandSpec`] (usually read from a TOML
//! [`GrammarFile`]), is validated and frozen into a [`CommandTree`] once, and
//! is then only read by completion requests.
//!
//! # Examples
//!
//! ```
//! use comptree::grammar::{CommandSpec, CommandTree, FlagSpec, ValueCompletion};
//!
//! let spec = CommandSpec::new("app")
//!     .flag(FlagSpec::boolean("verbose").short('v').inherited())
//!     .subcommand(
//!         CommandSpec::new("open")
//!             .flag(FlagSpec::value("file").completion(ValueCompletion::filenames(["txt"]))),
//!     );
//! let tree = CommandTree::build(&spec).unwrap();
//! assert_eq!(tree.child_names(tree.root()).collect::<Vec<_>>(), vec!["open"]);
//! ```

mod classify;
mod spec;
mod tree;

pub use classify::{FLAG_MARKER, FlagTable, VALUE_MARKER, flag_name, split_flag_word};
pub use spec::{CommandSpec, FlagScope, FlagSpec, GrammarFile, HandlerSpec, ValueCompletion};
pub use tree::{CommandNode, CommandTree, NodeId};
