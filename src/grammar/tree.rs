//! Immutable command tree
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. The parent
//! link is only used to compute command paths. Hidden and deprecated
//! commands are dropped with their whole subtree while building, so every
//! node in a built tree is visible.

use std::collections::{BTreeSet, HashMap};

use super::classify::{FLAG_MARKER, FlagTable, VALUE_MARKER};
use super::spec::{CommandSpec, FlagScope, FlagSpec};
use crate::error::{GrammarError, Result};

/// Index of a node in its [`CommandTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One command or subcommand
#[derive(Debug, Clone)]
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    required_positionals: Vec<String>,
    positional_aliases: Vec<String>,
    flags: FlagTable,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names, sorted ascending
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Subcommands in registration order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Accepted positional literals, sorted ascending
    pub fn required_positionals(&self) -> &[String] {
        &self.required_positionals
    }

    /// Alternate positional literals, sorted ascending
    pub fn positional_aliases(&self) -> &[String] {
        &self.positional_aliases
    }

    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }
}

/// The frozen command grammar
#[derive(Debug, Clone)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    /// Alias to node, across the whole tree; later registrations overwrite
    aliases: HashMap<String, NodeId>,
}

impl CommandTree {
    /// Validate the registrations and build the tree
    ///
    /// The traversal is pre-order in registration order. Aliases go into one
    /// table for the whole tree, so when two commands declare the same alias
    /// the one visited last owns it.
    pub fn build(root: &CommandSpec) -> Result<Self> {
        let mut tree = CommandTree {
            nodes: Vec::new(),
            aliases: HashMap::new(),
        };
        // (spec, parent, inherited flags of the ancestors, nearest first)
        let mut stack: Vec<(&CommandSpec, Option<NodeId>, Vec<FlagSpec>)> =
            vec![(root, None, Vec::new())];

        while let Some((spec, parent, inherited)) = stack.pop() {
            let id = NodeId(tree.nodes.len());
            let path = match parent {
                Some(p) => format!("{} {}", tree.path(p), spec.name),
                None => spec.name.clone(),
            };
            validate_command(spec, &path)?;

            let mut aliases = spec.aliases.clone();
            aliases.sort();
            for alias in &aliases {
                if let Some(previous) = tree.aliases.insert(alias.clone(), id) {
                    tracing::debug!(
                        alias = %alias,
                        previous = %tree.path(previous),
                        command = %path,
                        "alias reassigned"
                    );
                }
            }

            let mut required_positionals = spec.valid_args.clone();
            required_positionals.sort();
            let mut positional_aliases = spec.arg_aliases.clone();
            positional_aliases.sort();

            tree.nodes.push(CommandNode {
                name: spec.name.clone(),
                aliases,
                parent,
                children: Vec::new(),
                required_positionals,
                positional_aliases,
                flags: FlagTable::classify(&spec.flags, &inherited),
            });
            if let Some(p) = parent {
                tree.nodes[p.0].children.push(id);
            }

            let mut below: Vec<FlagSpec> = spec
                .flags
                .iter()
                .filter(|f| f.scope == FlagScope::Inherited && f.is_visible())
                .cloned()
                .collect();
            below.extend(inherited);

            // Reverse so the first registered child is visited first.
            let children: Vec<&CommandSpec> =
                spec.commands.iter().filter(|c| c.is_visible()).collect();
            check_sibling_names(&children, &path)?;
            for child in children.into_iter().rev() {
                stack.push((child, Some(id), below.clone()));
            }
        }

        tracing::debug!(
            nodes = tree.nodes.len(),
            aliases = tree.aliases.len(),
            "built command tree"
        );
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Number of commands in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in pre-order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Names of the children of `id`, in registration order
    pub fn child_names(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.node(id)
            .children
            .iter()
            .map(|&child| self.node(child).name())
    }

    /// Resolve a typed word to a child of `id`
    ///
    /// Matches a child's name first, then the global alias table; an alias
    /// that resolves to a node outside `id`'s children does not match.
    pub fn resolve_child(&self, id: NodeId, word: &str) -> Option<NodeId> {
        let children = &self.node(id).children;
        children
            .iter()
            .copied()
            .find(|&child| self.node(child).name == word)
            .or_else(|| {
                self.aliases
                    .get(word)
                    .copied()
                    .filter(|target| children.contains(target))
            })
    }

    /// Node owning `alias` in the global table
    pub fn alias_target(&self, alias: &str) -> Option<NodeId> {
        self.aliases.get(alias).copied()
    }

    /// Space-joined names from the root down to `id`
    pub fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            names.push(self.node(node).name.as_str());
            current = self.node(node).parent;
        }
        names.reverse();
        names.join(" ")
    }
}

fn validate_command(spec: &CommandSpec, path: &str) -> Result<()> {
    if spec.name.is_empty() {
        return Err(GrammarError::EmptyName {
            command: path.to_string(),
        }
        .into());
    }
    for name in std::iter::once(&spec.name).chain(spec.aliases.iter()) {
        if !is_command_word(name) {
            return Err(GrammarError::InvalidCommandName {
                command: path.to_string(),
                name: name.clone(),
            }
            .into());
        }
    }

    let mut names = BTreeSet::new();
    let mut shorthands = BTreeSet::new();
    for flag in &spec.flags {
        if flag.name.is_empty() {
            return Err(GrammarError::EmptyName {
                command: path.to_string(),
            }
            .into());
        }
        let bad_short = flag
            .shorthand
            .is_some_and(|c| c == FLAG_MARKER || c == VALUE_MARKER || c.is_whitespace());
        if flag.name.starts_with(FLAG_MARKER)
            || flag.name.contains(VALUE_MARKER)
            || flag.name.contains(char::is_whitespace)
            || bad_short
        {
            return Err(GrammarError::InvalidFlagName {
                command: path.to_string(),
                flag: flag.name.clone(),
            }
            .into());
        }
        if !names.insert(flag.name.as_str()) {
            return Err(GrammarError::DuplicateFlag {
                command: path.to_string(),
                flag: flag.name.clone(),
            }
            .into());
        }
        if let Some(short) = flag.shorthand
            && !shorthands.insert(short)
        {
            return Err(GrammarError::DuplicateShorthand {
                command: path.to_string(),
                shorthand: short,
            }
            .into());
        }
        if flag.completion.is_some() && !flag.takes_value {
            return Err(GrammarError::CompletionOnBooleanFlag {
                command: path.to_string(),
                flag: flag.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_sibling_names(children: &[&CommandSpec], parent: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for child in children {
        if !seen.insert(child.name.as_str()) {
            return Err(GrammarError::DuplicateCommand {
                parent: parent.to_string(),
                name: child.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// A name the walker can see as a command: non-empty, no flag marker, no blanks
fn is_command_word(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(FLAG_MARKER) && !name.contains(char::is_whitespace)
}
