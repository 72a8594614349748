//! Raw command and flag registrations
//!
//! These types are what an application declares: they deserialize from a TOML
//! grammar file and can also be assembled in code with the builder methods.
//! They are validated and frozen into a [`CommandTree`](super::CommandTree)
//! before any completion request runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GrammarError, Result};

/// Scope of a flag within the command tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagScope {
    /// Applies only to the declaring command; supplying it hides subcommands
    #[default]
    Local,
    /// Visible on the declaring command and all of its descendants
    Inherited,
}

/// How the value of a flag is completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValueCompletion {
    /// Filenames, restricted to the given extensions (all files when empty)
    FilenameExtension {
        #[serde(default)]
        extensions: Vec<String>,
    },
    /// Directories below `root` (the working directory when absent)
    Subdirectories {
        #[serde(default)]
        root: Option<PathBuf>,
    },
    /// A named handler registered with the value completer
    Custom { handler: String },
}

impl ValueCompletion {
    /// Filename completion limited to `extensions`
    pub fn filenames<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FilenameExtension {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Directory completion below `root`
    pub fn subdirectories(root: impl Into<PathBuf>) -> Self {
        Self::Subdirectories {
            root: Some(root.into()),
        }
    }

    /// Completion through the named custom handler
    pub fn custom(handler: impl Into<String>) -> Self {
        Self::Custom {
            handler: handler.into(),
        }
    }

    /// Name of the custom handler, if this is a custom completion
    pub fn handler(&self) -> Option<&str> {
        match self {
            Self::Custom { handler } => Some(handler),
            _ => None,
        }
    }
}

/// One flag registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagSpec {
    /// Canonical name, without the leading dashes
    pub name: String,

    /// Optional single-character shorthand
    #[serde(default)]
    pub shorthand: Option<char>,

    /// Whether the flag expects a value
    #[serde(default)]
    pub takes_value: bool,

    #[serde(default)]
    pub scope: FlagScope,

    /// Member of the declaring command's required-flag group
    #[serde(default)]
    pub required: bool,

    /// How to complete the flag's value
    #[serde(default)]
    pub completion: Option<ValueCompletion>,

    #[serde(default)]
    pub hidden: bool,

    /// Deprecation message; deprecated flags are never offered
    #[serde(default)]
    pub deprecated: Option<String>,
}

impl FlagSpec {
    fn new(name: impl Into<String>, takes_value: bool) -> Self {
        Self {
            name: name.into(),
            shorthand: None,
            takes_value,
            scope: FlagScope::Local,
            required: false,
            completion: None,
            hidden: false,
            deprecated: None,
        }
    }

    /// A toggle flag
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// A flag that takes a value
    pub fn value(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn short(mut self, shorthand: char) -> Self {
        self.shorthand = Some(shorthand);
        self
    }

    pub fn inherited(mut self) -> Self {
        self.scope = FlagScope::Inherited;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn completion(mut self, completion: ValueCompletion) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    /// Whether the flag takes part in completion at all
    pub fn is_visible(&self) -> bool {
        !self.hidden && self.deprecated.is_none()
    }
}

/// One command registration, with its subcommands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Accepted positional literals
    #[serde(default)]
    pub valid_args: Vec<String>,

    /// Alternate literals that also satisfy `valid_args`
    #[serde(default)]
    pub arg_aliases: Vec<String>,

    #[serde(default)]
    pub flags: Vec<FlagSpec>,

    #[serde(default)]
    pub hidden: bool,

    /// Deprecation message; deprecated commands are never offered
    #[serde(default)]
    pub deprecated: Option<String>,

    /// Help topic with no behaviour of its own; never offered or entered
    #[serde(default)]
    pub help_only: bool,

    /// Subcommands, in suggestion order
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            valid_args: Vec::new(),
            arg_aliases: Vec::new(),
            flags: Vec::new(),
            hidden: false,
            deprecated: None,
            help_only: false,
            commands: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn valid_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_aliases<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arg_aliases.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn subcommand(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    pub fn help_only(mut self) -> Self {
        self.help_only = true;
        self
    }

    /// Whether the command can be descended into and offered
    pub fn is_visible(&self) -> bool {
        !self.hidden && !self.help_only && self.deprecated.is_none()
    }

    /// Custom handler names referenced by visible flags in this subtree
    pub fn handler_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        let mut stack = vec![self];
        while let Some(command) = stack.pop() {
            if !command.is_visible() {
                continue;
            }
            refs.extend(
                command
                    .flags
                    .iter()
                    .filter(|f| f.is_visible())
                    .filter_map(|f| f.completion.as_ref().and_then(ValueCompletion::handler)),
            );
            stack.extend(command.commands.iter());
        }
        refs
    }
}

/// A custom handler declared in a grammar file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerSpec {
    /// A fixed word list, filtered by prefix
    Words(Vec<String>),
    /// A program and its arguments; each line of its stdout is a candidate
    Command(Vec<String>),
}

/// Contents of a grammar file
///
/// ```toml
/// custom_hook = "resources"
///
/// [handlers]
/// resources = { words = ["pods", "services"] }
///
/// [command]
/// name = "kubectl"
///
/// [[command.commands]]
/// name = "get"
/// valid_args = ["pods", "services"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarFile {
    /// Handler consulted when nothing else matches
    #[serde(default)]
    pub custom_hook: Option<String>,

    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerSpec>,

    /// The root command
    pub command: CommandSpec,
}

impl GrammarFile {
    /// Parse a grammar from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let grammar: GrammarFile =
            toml::from_str(text).map_err(|e| GrammarError::Parse(e.to_string()))?;
        grammar.check_handlers()?;
        Ok(grammar)
    }

    /// Load a grammar file from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GrammarError::FileNotFound(path.display().to_string()).into());
        }
        let text = std::fs::read_to_string(path)?;
        let grammar = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), root = %grammar.command.name, "loaded grammar");
        Ok(grammar)
    }

    /// Every handler reference must name a declared handler
    fn check_handlers(&self) -> Result<()> {
        for (name, handler) in &self.handlers {
            if matches!(handler, HandlerSpec::Command(argv) if argv.is_empty()) {
                return Err(
                    GrammarError::Parse(format!("handler '{name}' has an empty command")).into(),
                );
            }
        }
        let referenced = self
            .command
            .handler_refs()
            .into_iter()
            .chain(self.custom_hook.as_deref());
        for handler in referenced {
            if !self.handlers.contains_key(handler) {
                return Err(GrammarError::UnknownHandler {
                    handler: handler.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComptreeError;

    const GRAMMAR: &str = r#"
custom_hook = "objects"

[handlers]
objects = { words = ["pod", "service"] }
contexts = { command = ["kubectl", "config", "get-contexts", "-o", "name"] }

[command]
name = "kubectl"
flags = [
    { name = "context", takes_value = true, scope = "inherited", completion = { kind = "custom", handler = "contexts" } },
    { name = "verbose", shorthand = "v" },
]

[[command.commands]]
name = "apply"
aliases = ["ap"]

[[command.commands.flags]]
name = "filename"
shorthand = "f"
takes_value = true
required = true
completion = { kind = "filename-extension", extensions = ["yaml", "json"] }
"#;

    #[test]
    fn test_parses_a_grammar_file() {
        let grammar = GrammarFile::from_toml(GRAMMAR).unwrap();
        assert_eq!(grammar.custom_hook.as_deref(), Some("objects"));
        assert_eq!(grammar.command.name, "kubectl");
        assert_eq!(grammar.command.flags.len(), 2);
        assert_eq!(grammar.command.flags[0].scope, FlagScope::Inherited);
        assert_eq!(grammar.command.flags[1].shorthand, Some('v'));

        let apply = &grammar.command.commands[0];
        assert_eq!(apply.aliases, vec!["ap"]);
        assert!(apply.flags[0].required);
        assert_eq!(
            apply.flags[0].completion,
            Some(ValueCompletion::filenames(["yaml", "json"]))
        );
        assert_eq!(
            grammar.handlers.get("objects"),
            Some(&HandlerSpec::Words(vec!["pod".into(), "service".into()]))
        );
    }

    #[test]
    fn test_rejects_unknown_handler() {
        let text = r#"
[command]
name = "app"
flags = [{ name = "x", takes_value = true, completion = { kind = "custom", handler = "nope" } }]
"#;
        let err = GrammarFile::from_toml(text).unwrap_err();
        assert!(matches!(
            err,
            ComptreeError::Grammar(GrammarError::UnknownHandler { ref handler }) if handler == "nope"
        ));
    }

    #[test]
    fn test_rejects_unknown_hook() {
        let text = r#"
custom_hook = "missing"

[command]
name = "app"
"#;
        assert!(GrammarFile::from_toml(text).is_err());
    }

    #[test]
    fn test_rejects_empty_handler_command() {
        let text = r#"
[handlers]
broken = { command = [] }

[command]
name = "app"
"#;
        let err = GrammarFile::from_toml(text).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_hidden_commands_do_not_need_their_handlers() {
        let spec = CommandSpec::new("app").subcommand(
            CommandSpec::new("old")
                .hidden()
                .flag(FlagSpec::value("x").completion(ValueCompletion::custom("gone"))),
        );
        assert!(spec.handler_refs().is_empty());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = GrammarFile::from_toml("[command").unwrap_err();
        assert!(matches!(err, ComptreeError::Grammar(GrammarError::Parse(_))));
    }

    #[test]
    fn test_builder_sets_flag_attributes() {
        let flag = FlagSpec::value("output")
            .short('o')
            .inherited()
            .required()
            .completion(ValueCompletion::subdirectories("/tmp"));
        assert!(flag.takes_value);
        assert_eq!(flag.shorthand, Some('o'));
        assert_eq!(flag.scope, FlagScope::Inherited);
        assert!(flag.required);
        assert!(flag.is_visible());
        assert!(!FlagSpec::boolean("old").deprecated("use --new").is_visible());
    }

    #[test]
    fn test_help_only_commands_are_invisible() {
        assert!(CommandSpec::new("get").is_visible());
        assert!(!CommandSpec::new("help").help_only().is_visible());

        let grammar = GrammarFile::from_toml(
            "[command]\nname = \"app\"\n\n[[command.commands]]\nname = \"help\"\nhelp_only = true\n",
        )
        .unwrap();
        assert!(grammar.command.commands[0].help_only);
        assert!(!grammar.command.commands[0].is_visible());
    }

    #[test]
    fn test_bundled_demo_grammar_loads() {
        let grammar = GrammarFile::from_toml(include_str!("../../grammars/demo.toml")).unwrap();
        assert_eq!(grammar.command.name, "kubectl");
        assert_eq!(grammar.custom_hook.as_deref(), Some("resources"));
        assert_eq!(grammar.handlers.len(), 3);

        let config = &grammar.command.commands[2];
        assert_eq!(config.name, "config");
        assert_eq!(config.commands.len(), 3);
        assert!(!grammar.command.commands[3].is_visible());
    }
}
