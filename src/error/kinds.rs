use std::{fmt, io};

/// Crate-wide `Result` type using [`ComptreeError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ComptreeError>;

/// Top-level error type for comptree operations.
///
/// Completion resolution itself never fails; these errors come from loading
/// grammars and configuration, from value completers, and from the CLI.
#[derive(Debug)]
pub enum ComptreeError {
    /// Grammar construction or loading errors.
    Grammar(GrammarError),

    /// Configuration errors.
    Config(ConfigError),

    /// Value completer or custom handler errors.
    Completer(CompleterError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Defects found while building a command tree from its registrations.
#[derive(Debug)]
pub enum GrammarError {
    /// A command or flag was registered without a name.
    EmptyName { command: String },

    /// A command name or alias cannot be typed as a single word.
    InvalidCommandName { command: String, name: String },

    /// A flag name cannot be rendered as a `--name` token.
    InvalidFlagName { command: String, flag: String },

    /// Two visible siblings share a name.
    DuplicateCommand { parent: String, name: String },

    /// Two flags on one command share a name.
    DuplicateFlag { command: String, flag: String },

    /// Two flags on one command share a shorthand.
    DuplicateShorthand { command: String, shorthand: char },

    /// A value completion was attached to a flag that takes no value.
    CompletionOnBooleanFlag { command: String, flag: String },

    /// A custom completion refers to a handler that was never registered.
    UnknownHandler { handler: String },

    /// The grammar file could not be parsed.
    Parse(String),

    /// The grammar file does not exist.
    FileNotFound(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// No grammar file was given and none is configured.
    NoGrammar,

    /// Generic configuration error.
    Generic(String),
}

/// Errors raised by value completers and custom handlers.
///
/// The completion engine never propagates these; it logs them and treats the
/// failing source as having produced no candidates.
#[derive(Debug)]
pub enum CompleterError {
    /// No handler is registered under the given name.
    HandlerNotFound(String),

    /// A handler ran but failed.
    HandlerFailed { handler: String, message: String },

    /// A directory listing failed.
    Listing { path: String, source: io::Error },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ComptreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComptreeError::Grammar(e) => write!(f, "Grammar error: {e}"),
            ComptreeError::Config(e) => write!(f, "Configuration error: {e}"),
            ComptreeError::Completer(e) => write!(f, "Completer error: {e}"),
            ComptreeError::Io(e) => write!(f, "I/O error: {e}"),
            ComptreeError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::EmptyName { command } => {
                write!(f, "Empty command or flag name under '{command}'")
            }
            GrammarError::InvalidCommandName { command, name } => {
                write!(f, "Invalid command name or alias '{name}' under '{command}'")
            }
            GrammarError::InvalidFlagName { command, flag } => {
                write!(f, "Invalid flag name '{flag}' on '{command}'")
            }
            GrammarError::DuplicateCommand { parent, name } => {
                write!(f, "Duplicate command '{name}' under '{parent}'")
            }
            GrammarError::DuplicateFlag { command, flag } => {
                write!(f, "Duplicate flag '--{flag}' on '{command}'")
            }
            GrammarError::DuplicateShorthand { command, shorthand } => {
                write!(f, "Duplicate shorthand '-{shorthand}' on '{command}'")
            }
            GrammarError::CompletionOnBooleanFlag { command, flag } => {
                write!(
                    f,
                    "Flag '--{flag}' on '{command}' takes no value but has a value completion"
                )
            }
            GrammarError::UnknownHandler { handler } => {
                write!(f, "Unknown completion handler: {handler}")
            }
            GrammarError::Parse(msg) => write!(f, "Invalid grammar file: {msg}"),
            GrammarError::FileNotFound(path) => write!(f, "Grammar file not found: {path}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::NoGrammar => write!(
                f,
                "No grammar file given; pass --grammar or set completion.grammar"
            ),
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for CompleterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompleterError::HandlerNotFound(name) => {
                write!(f, "Completion handler not found: {name}")
            }
            CompleterError::HandlerFailed { handler, message } => {
                write!(f, "Completion handler '{handler}' failed: {message}")
            }
            CompleterError::Listing { path, source } => {
                write!(f, "Cannot list '{path}': {source}")
            }
        }
    }
}

impl std::error::Error for ComptreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComptreeError::Io(e) => Some(e),
            ComptreeError::Completer(CompleterError::Listing { source, .. }) => Some(source),
            _ => None,
        }
    }
}
impl std::error::Error for GrammarError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for CompleterError {}

/* ========================= Conversions to ComptreeError ========================= */

impl From<io::Error> for ComptreeError {
    fn from(err: io::Error) -> Self {
        ComptreeError::Io(err)
    }
}

impl From<GrammarError> for ComptreeError {
    fn from(err: GrammarError) -> Self {
        ComptreeError::Grammar(err)
    }
}

impl From<ConfigError> for ComptreeError {
    fn from(err: ConfigError) -> Self {
        ComptreeError::Config(err)
    }
}

impl From<CompleterError> for ComptreeError {
    fn from(err: CompleterError) -> Self {
        ComptreeError::Completer(err)
    }
}

impl From<serde_json::Error> for ComptreeError {
    fn from(err: serde_json::Error) -> Self {
        ComptreeError::Generic(format!("JSON error: {err}"))
    }
}

impl From<String> for ComptreeError {
    fn from(msg: String) -> Self {
        ComptreeError::Generic(msg)
    }
}

impl From<&str> for ComptreeError {
    fn from(msg: &str) -> Self {
        ComptreeError::Generic(msg.to_owned())
    }
}
