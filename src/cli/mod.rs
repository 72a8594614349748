//! Command-line interface for comptree
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Grammar loading and engine construction
//! - Dispatch of the subcommands

pub mod completion;

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::completion::{CompletionEngine, CompletionRequest, Completions, HandlerRegistry};
use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::{ConfigError, Result};
use crate::grammar::{CommandTree, GrammarFile};
use crate::repl::ReplEngine;

/// comptree - completion resolution for command grammars
#[derive(Parser, Debug)]
#[command(
    name = "comptree",
    version,
    about = "Shell completion resolution over a command/flag grammar",
    long_about = "Resolves completion candidates for a partially typed command line against a
grammar file describing commands, flags and positional arguments."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for comptree
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print completion candidates for a command line
    Complete {
        /// Grammar file
        #[arg(short = 'g', long, value_name = "FILE")]
        grammar: Option<PathBuf>,

        /// Index of the word being completed (default: the last word)
        #[arg(long, value_name = "N")]
        cword: Option<usize>,

        /// Complete a raw line instead of words
        #[arg(long, value_name = "LINE", conflicts_with = "words")]
        line: Option<String>,

        /// Cursor byte offset in --line (default: end of line)
        #[arg(long, value_name = "N", requires = "line")]
        point: Option<usize>,

        /// Output format (lines, json)
        #[arg(long, value_name = "FORMAT")]
        format: Option<String>,

        /// Words of the command line, program name first
        #[arg(last = true, value_name = "WORDS")]
        words: Vec<String>,
    },

    /// Print the classified command tree
    Describe {
        /// Grammar file
        #[arg(short = 'g', long, value_name = "FILE")]
        grammar: Option<PathBuf>,
    },

    /// Validate a grammar file
    Check {
        /// Grammar file
        #[arg(short = 'g', long, value_name = "FILE")]
        grammar: Option<PathBuf>,
    },

    /// Interactive shell with Tab completion
    Repl {
        /// Grammar file
        #[arg(short = 'g', long, value_name = "FILE")]
        grammar: Option<PathBuf>,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: String,

        /// Emit completion glue for this program instead of comptree
        #[arg(long, value_name = "NAME", requires = "grammar")]
        program: Option<String>,

        /// Grammar file of --program
        #[arg(short = 'g', long, value_name = "FILE")]
        grammar: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file and apply overrides
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        config.apply_env();

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_logging_args(&mut config, args);
        Ok(config)
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Parse output format string
    fn parse_output_format(format_str: &str) -> Result<OutputFormat> {
        match format_str.to_lowercase().as_str() {
            "lines" => Ok(OutputFormat::Lines),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "format".to_string(),
                value: format_str.to_string(),
            }
            .into()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the grammar named on the command line or in the configuration
    fn load_grammar(&self, explicit: Option<&Path>) -> Result<GrammarFile> {
        let path = self.config.grammar_path(explicit)?;
        GrammarFile::from_path(path)
    }

    fn load_engine(&self, explicit: Option<&Path>) -> Result<CompletionEngine> {
        let grammar = self.load_grammar(explicit)?;
        CompletionEngine::from_grammar(&grammar, &self.config.completion)
    }

    /// Handle the selected subcommand
    pub fn handle_subcommand(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match &self.args.command {
            Commands::Complete {
                grammar,
                cword,
                line,
                point,
                format,
                words,
            } => {
                let format = match format {
                    Some(f) => Self::parse_output_format(f)?,
                    None => self.config.completion.output,
                };
                let engine = self.load_engine(grammar.as_deref())?;
                let completions = match line {
                    Some(line) => engine.complete_line(line, point.unwrap_or(line.len())).1,
                    None => complete_words(&engine, words, *cword),
                };
                write_completions(&mut out, &completions, format)
            }
            Commands::Describe { grammar } => {
                let grammar = self.load_grammar(grammar.as_deref())?;
                let tree = CommandTree::build(&grammar.command)?;
                describe_tree(&mut out, &tree)
            }
            Commands::Check { grammar } => self.check_grammar(&mut out, grammar.as_deref()),
            Commands::Repl { grammar } => {
                let engine = self.load_engine(grammar.as_deref())?;
                let mut repl = ReplEngine::new(engine);
                repl.run()
            }
            Commands::Completion {
                shell,
                program,
                grammar,
            } => {
                let target = program.as_deref().zip(grammar.as_deref());
                completion::generate_completion(shell, target, &mut out)
            }
            Commands::Version => {
                writeln!(out, "comptree version {}", env!("CARGO_PKG_VERSION"))?;
                writeln!(out, "Rust version: {}", env!("CARGO_PKG_RUST_VERSION"))?;
                Ok(())
            }
        }
    }

    /// Validate a grammar file and report what it holds
    fn check_grammar<W: Write>(&self, out: &mut W, explicit: Option<&Path>) -> Result<()> {
        let path = self.config.grammar_path(explicit)?;
        writeln!(out, "Validating grammar file: {}", path.display())?;

        let grammar = GrammarFile::from_path(&path)?;
        let tree = CommandTree::build(&grammar.command)?;
        writeln!(
            out,
            "✅ Grammar is valid: {} command(s), {} handler(s)",
            tree.len(),
            grammar.handlers.len()
        )?;

        let handlers = HandlerRegistry::from_specs(&grammar.handlers);
        let names: Vec<&str> = handlers.names().collect();
        if !names.is_empty() {
            writeln!(out, "  handlers: {}", names.join(" "))?;
        }
        Ok(())
    }
}

/// Complete shell words; `cword` defaults to the last word
fn complete_words(engine: &CompletionEngine, words: &[String], cword: Option<usize>) -> Completions {
    let cword = cword.unwrap_or(words.len().saturating_sub(1));
    match CompletionRequest::from_shell_words(words, cword) {
        Some(request) => engine.complete(&request),
        None => Completions::default(),
    }
}

/// Print candidates in the requested format
fn write_completions<W: Write>(
    out: &mut W,
    completions: &Completions,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Lines => {
            for candidate in &completions.candidates {
                writeln!(out, "{}", candidate.value)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string(completions)?)?;
        }
    }
    Ok(())
}

/// Print every node with its classified flags
fn describe_tree<W: Write>(out: &mut W, tree: &CommandTree) -> Result<()> {
    for id in tree.ids() {
        let node = tree.node(id);
        writeln!(out, "{}", tree.path(id))?;

        let rows: [(&str, Vec<&str>); 7] = [
            ("aliases", node.aliases().iter().map(String::as_str).collect()),
            ("commands", tree.child_names(id).collect()),
            ("flags", node.flags().all_tokens().iter().map(String::as_str).collect()),
            ("two-word flags", node.flags().value_taking_names().collect()),
            ("local flags", node.flags().local_only_names().collect()),
            ("required flags", node.flags().required_tokens().iter().map(String::as_str).collect()),
            ("nouns", node.required_positionals().iter().map(String::as_str).collect()),
        ];
        for (label, values) in rows.iter().filter(|(_, v)| !v.is_empty()) {
            writeln!(out, "  {label}: {}", values.join(" "))?;
        }
        if !node.positional_aliases().is_empty() {
            writeln!(out, "  noun aliases: {}", node.positional_aliases().join(" "))?;
        }
        for (flag, completion) in node.flags().completions() {
            writeln!(out, "  {flag} completes: {}", serde_json::to_string(completion)?)?;
        }
    }
    Ok(())
}
