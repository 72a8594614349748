//! Interactive shell for trying out a grammar
//!
//! The REPL reads lines for the program the grammar describes, with Tab
//! completion driven by the [`CompletionEngine`]. Each entered line is
//! walked through the command tree and summarized: the command reached,
//! the flag values bound, the positionals seen, and any required flags or
//! positionals still missing.

pub mod completer;
pub mod prompt;

pub use completer::GrammarCompleter;
pub use prompt::ReplPrompt;

use reedline::{
    ColumnarMenu, Emacs, KeyCode, KeyModifiers, MenuBuilder, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, default_emacs_keybindings,
};

use crate::completion::{CompletionEngine, CompletionRequest, TokenStream};
use crate::error::Result;

const COMPLETION_MENU: &str = "completion_menu";

/// REPL engine wrapping a line editor and a completion engine
pub struct ReplEngine {
    /// Line editor
    editor: Reedline,

    /// Prompt naming the grammar's program
    prompt: ReplPrompt,

    /// Engine used for completion and line summaries
    engine: CompletionEngine,
}

impl ReplEngine {
    /// Create a new REPL engine
    ///
    /// # Arguments
    /// * `engine` - Completion engine for the loaded grammar
    pub fn new(engine: CompletionEngine) -> Self {
        let program = engine.tree().node(engine.tree().root()).name().to_string();

        let menu = ColumnarMenu::default().with_name(COMPLETION_MENU);
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let editor = Reedline::create()
            .with_completer(Box::new(GrammarCompleter::new(engine.clone())))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        Self {
            editor,
            prompt: ReplPrompt::new(program),
            engine,
        }
    }

    /// Read a line of input
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line or None on EOF
    pub fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            match self.editor.read_line(&self.prompt)? {
                Signal::Success(line) => return Ok(Some(line)),
                Signal::CtrlD => return Ok(None),
                // Ctrl-C drops the current line
                _ => continue,
            }
        }
    }

    /// Summarize how `line` walks the command tree
    pub fn describe(&self, line: &str) -> String {
        let stream = TokenStream::parse(line, line.len());
        let request = CompletionRequest::new(stream.words.iter().map(|w| w.text.clone()), "");
        let state = self.engine.walk(&request);
        let tree = self.engine.tree();

        let mut lines = vec![format!("command: {}", tree.path(state.node))];
        if !state.flag_values.is_empty() {
            let flags: Vec<String> = state
                .flag_values
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            lines.push(format!("flags: {}", flags.join(" ")));
        }
        if !state.nouns.is_empty() {
            lines.push(format!("nouns: {}", state.nouns.join(" ")));
        }
        if !state.required_flags.is_empty() {
            lines.push(format!(
                "missing one of: {}",
                state.required_flags.join(" ")
            ));
        }
        if !state.required_positionals.is_empty() {
            lines.push(format!(
                "missing one of: {}",
                state.required_positionals.join(" ")
            ));
        }
        lines.join("\n")
    }

    /// Run until EOF or `exit`
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(program = %self.engine.tree().path(self.engine.tree().root()), "starting repl");

        while let Some(line) = self.read_line()? {
            let line = line.trim();
            match line {
                "" => continue,
                "exit" | "quit" => break,
                _ => println!("{}", self.describe(line)),
            }
        }

        Ok(())
    }
}
