//! Value completers and custom hooks
//!
//! The engine hands flag values it cannot complete itself to a
//! [`ValueCompleter`], and asks a [`CompletionHook`] when its own candidate
//! logic comes up empty. Both are opaque synchronous calls. This module also
//! provides the default implementations: filesystem listing for filename and
//! subdirectory annotations, and a registry of named handlers for custom ones.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::error::{CompleterError, Result};
use crate::grammar::{HandlerSpec, NodeId, ValueCompletion};

/// Trait for completing flag values
pub trait ValueCompleter: Send + Sync {
    /// Candidates for `partial` under the given annotation
    ///
    /// An error means this source has nothing to offer; the engine moves on
    /// to its fallbacks.
    fn complete(&self, completion: &ValueCompletion, partial: &str) -> Result<Vec<String>>;
}

/// What a custom hook is told about the request
#[derive(Debug, Clone)]
pub struct HookContext<'a> {
    /// Node the walk ended on
    pub node: NodeId,
    /// Space-joined command path of that node
    pub command_path: String,
    /// Words typed before the cursor word
    pub words: &'a [String],
    /// The cursor word
    pub current: &'a str,
}

/// Trait for the root command's last-resort completion
pub trait CompletionHook: Send + Sync {
    fn complete(&self, context: &HookContext<'_>) -> Result<Vec<String>>;
}

/// Input of a custom handler
#[derive(Debug, Clone, Copy)]
pub struct HandlerRequest<'a> {
    /// Text being completed
    pub partial: &'a str,
    /// Command path, when the handler runs as a hook
    pub command_path: Option<&'a str>,
    /// Typed words, when the handler runs as a hook
    pub words: &'a [String],
}

impl<'a> HandlerRequest<'a> {
    /// Request for a flag value
    pub fn value(partial: &'a str) -> Self {
        Self {
            partial,
            command_path: None,
            words: &[],
        }
    }
}

/// A named source of candidates
pub trait CustomHandler: Send + Sync {
    fn candidates(&self, request: &HandlerRequest<'_>) -> Result<Vec<String>>;
}

/// Fixed word list, filtered by prefix
#[derive(Debug, Clone)]
pub struct WordListHandler {
    words: Vec<String>,
}

impl WordListHandler {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl CustomHandler for WordListHandler {
    fn candidates(&self, request: &HandlerRequest<'_>) -> Result<Vec<String>> {
        Ok(self
            .words
            .iter()
            .filter(|w| w.starts_with(request.partial))
            .cloned()
            .collect())
    }
}

/// External program; every non-empty stdout line is a candidate
///
/// The program receives `COMP_CUR` (the partial text), `COMP_COMMAND` (the
/// command path, hooks only) and `COMP_WORDS` (the typed words joined by
/// spaces, hooks only) in its environment.
#[derive(Debug, Clone)]
pub struct ExternalCommandHandler {
    name: String,
    argv: Vec<String>,
}

impl ExternalCommandHandler {
    pub fn new(name: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            name: name.into(),
            argv,
        }
    }

    fn failed(&self, message: impl Into<String>) -> CompleterError {
        CompleterError::HandlerFailed {
            handler: self.name.clone(),
            message: message.into(),
        }
    }
}

impl CustomHandler for ExternalCommandHandler {
    fn candidates(&self, request: &HandlerRequest<'_>) -> Result<Vec<String>> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| self.failed("empty command"))?;

        let output = Command::new(program)
            .args(args)
            .env("COMP_CUR", request.partial)
            .env("COMP_COMMAND", request.command_path.unwrap_or_default())
            .env("COMP_WORDS", request.words.join(" "))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.failed(e.to_string()))?;

        if !output.status.success() {
            return Err(self.failed(format!("exited with {}", output.status)).into());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Closure wrapped as a handler
struct FnHandler<F>(F);

impl<F> CustomHandler for FnHandler<F>
where
    F: Fn(&HandlerRequest<'_>) -> Result<Vec<String>> + Send + Sync,
{
    fn candidates(&self, request: &HandlerRequest<'_>) -> Result<Vec<String>> {
        (self.0)(request)
    }
}

/// Named custom handlers
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn CustomHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the handlers declared in a grammar file
    pub fn from_specs(specs: &BTreeMap<String, HandlerSpec>) -> Self {
        let mut registry = Self::new();
        for (name, spec) in specs {
            match spec {
                HandlerSpec::Words(words) => {
                    registry.register(name.clone(), WordListHandler::new(words.iter().cloned()))
                }
                HandlerSpec::Command(argv) => registry.register(
                    name.clone(),
                    ExternalCommandHandler::new(name.clone(), argv.clone()),
                ),
            }
        }
        registry
    }

    /// Register `handler` under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, handler: impl CustomHandler + 'static) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Register a closure under `name`
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&HandlerRequest<'_>) -> Result<Vec<String>> + Send + Sync + 'static,
    {
        self.register(name, FnHandler(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the named handler
    pub fn run(&self, name: &str, request: &HandlerRequest<'_>) -> Result<Vec<String>> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| CompleterError::HandlerNotFound(name.to_string()))?;
        handler.candidates(request)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Filesystem and handler backed value completer
#[derive(Debug, Clone)]
pub struct DefaultValueCompleter {
    /// Directory relative partial values resolve against
    base_dir: PathBuf,
    /// Offer dot-entries without a leading `.` in the partial value
    show_hidden: bool,
    handlers: HandlerRegistry,
}

impl DefaultValueCompleter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            show_hidden: false,
            handlers: HandlerRegistry::new(),
        }
    }

    /// Completer rooted at the process working directory
    pub fn current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn with_hidden_files(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Directories, and files whose extension is in `extensions`
    fn filenames(&self, partial: &str, extensions: &[String]) -> Result<Vec<String>> {
        let wanted: Vec<&str> = extensions
            .iter()
            .map(|e| e.strip_prefix('.').unwrap_or(e))
            .collect();
        self.list(&self.base_dir, partial, |path, is_dir| {
            is_dir
                || wanted.is_empty()
                || path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| wanted.contains(&e))
        })
    }

    /// Directories below `root`, relative to it
    fn subdirectories(&self, partial: &str, root: Option<&Path>) -> Result<Vec<String>> {
        let base = match root {
            Some(root) => self.base_dir.join(root),
            None => self.base_dir.clone(),
        };
        self.list(&base, partial, |_, is_dir| is_dir)
    }

    /// Entries of the directory part of `partial` whose names start with its
    /// file part, sorted; directories get a trailing `/`
    fn list<F>(&self, base: &Path, partial: &str, keep: F) -> Result<Vec<String>>
    where
        F: Fn(&Path, bool) -> bool,
    {
        let (dir_part, file_part) = match partial.rfind('/') {
            Some(i) => partial.split_at(i + 1),
            None => ("", partial),
        };
        let dir = base.join(dir_part);
        let show_hidden = self.show_hidden || file_part.starts_with('.');

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound || e.kind() == io::ErrorKind::NotADirectory => {
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(CompleterError::Listing {
                    path: dir.display().to_string(),
                    source,
                }
                .into());
            }
        };

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(file_part) || (name.starts_with('.') && !show_hidden) {
                continue;
            }
            let path = entry.path();
            // follows symlinks
            let is_dir = path.is_dir();
            if !keep(&path, is_dir) {
                continue;
            }
            let slash = if is_dir { "/" } else { "" };
            candidates.push(format!("{dir_part}{name}{slash}"));
        }
        candidates.sort();
        Ok(candidates)
    }
}

impl ValueCompleter for DefaultValueCompleter {
    fn complete(&self, completion: &ValueCompletion, partial: &str) -> Result<Vec<String>> {
        match completion {
            ValueCompletion::FilenameExtension { extensions } => self.filenames(partial, extensions),
            ValueCompletion::Subdirectories { root } => self.subdirectories(partial, root.as_deref()),
            ValueCompletion::Custom { handler } => {
                self.handlers.run(handler, &HandlerRequest::value(partial))
            }
        }
    }
}

/// Custom hook backed by a named handler
#[derive(Debug, Clone)]
pub struct HandlerHook {
    handlers: HandlerRegistry,
    name: String,
}

impl HandlerHook {
    pub fn new(handlers: HandlerRegistry, name: impl Into<String>) -> Self {
        Self {
            handlers,
            name: name.into(),
        }
    }
}

impl CompletionHook for HandlerHook {
    fn complete(&self, context: &HookContext<'_>) -> Result<Vec<String>> {
        let request = HandlerRequest {
            partial: context.current,
            command_path: Some(&context.command_path),
            words: context.words,
        };
        self.handlers.run(&self.name, &request)
    }
}
