//! Flag classification
//!
//! Every command node carries a [`FlagTable`] computed once while the tree is
//! built. It holds the flag tokens a shell can offer on that node and the
//! categories the token walker consults: value-taking flags, local-only flags,
//! the required-flag group and the value completion annotations.

use std::collections::{BTreeSet, HashMap};

use super::spec::{FlagScope, FlagSpec, ValueCompletion};

/// Prefix marking a word as a flag
pub const FLAG_MARKER: char = '-';

/// Suffix on the token of a flag that takes a value
pub const VALUE_MARKER: char = '=';

/// Strip the value marker from a flag token, yielding the flag name
///
/// `--file=` becomes `--file`; tokens without the marker are returned as is.
pub fn flag_name(token: &str) -> &str {
    token.strip_suffix(VALUE_MARKER).unwrap_or(token)
}

/// Split a typed flag word into its name and inline value
///
/// `--file=a.txt` yields `("--file", Some("a.txt"))`, `--file=` yields
/// `("--file", Some(""))` and `--file` yields `("--file", None)`.
pub fn split_flag_word(word: &str) -> (&str, Option<&str>) {
    match word.split_once(VALUE_MARKER) {
        Some((name, value)) => (name, Some(value)),
        None => (word, None),
    }
}

/// Classified flags of one command node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable {
    /// Offerable tokens, sorted by flag name: long form then shorthand
    all: Vec<String>,
    /// Names of flags whose value may follow as a separate word
    value_taking: BTreeSet<String>,
    /// Names of this node's local-scope flags
    local_only: BTreeSet<String>,
    /// Tokens of this node's required flags, sorted ascending
    required: Vec<String>,
    /// Flag name (long and short) to value completion
    completions: HashMap<String, ValueCompletion>,
}

impl FlagTable {
    /// Classify the flags visible on a node
    ///
    /// `own` are the flags declared on the node itself; `inherited` are the
    /// inherited-scope flags declared on its ancestors, nearest first. A
    /// node's own flag shadows an ancestor flag with the same name, and a
    /// nearer ancestor shadows a farther one.
    pub fn classify(own: &[FlagSpec], inherited: &[FlagSpec]) -> Self {
        let mut seen = BTreeSet::new();
        let mut applicable: Vec<(&FlagSpec, bool)> = Vec::new();
        for (flag, is_own) in own
            .iter()
            .map(|f| (f, true))
            .chain(inherited.iter().map(|f| (f, false)))
        {
            if !flag.is_visible() || !seen.insert(flag.name.as_str()) {
                continue;
            }
            applicable.push((flag, is_own));
        }
        applicable.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));

        let mut table = FlagTable::default();
        for (flag, is_own) in applicable {
            for name in flag_names(flag) {
                let token = if flag.takes_value {
                    format!("{name}{VALUE_MARKER}")
                } else {
                    name.clone()
                };

                if flag.takes_value {
                    table.value_taking.insert(name.clone());
                }
                if is_own && flag.scope == FlagScope::Local {
                    table.local_only.insert(name.clone());
                }
                if is_own && flag.required {
                    table.required.push(token.clone());
                }
                if let Some(completion) = flag.completion.as_ref().filter(|_| flag.takes_value) {
                    table.completions.insert(name.clone(), completion.clone());
                }
                table.all.push(token);
            }
        }
        table.required.sort();
        table
    }

    /// Every offerable flag token
    pub fn all_tokens(&self) -> &[String] {
        &self.all
    }

    /// Tokens of the required-flag group
    pub fn required_tokens(&self) -> &[String] {
        &self.required
    }

    /// Whether the named flag may take its value from the next word
    pub fn takes_separate_value(&self, name: &str) -> bool {
        self.value_taking.contains(name)
    }

    /// Whether the named flag is local to this node
    pub fn is_local_only(&self, name: &str) -> bool {
        self.local_only.contains(name)
    }

    /// Value completion annotated on the named flag
    pub fn value_completion(&self, name: &str) -> Option<&ValueCompletion> {
        self.completions.get(name)
    }

    /// Names of the value-taking flags, sorted
    pub fn value_taking_names(&self) -> impl Iterator<Item = &str> {
        self.value_taking.iter().map(String::as_str)
    }

    /// Names of the local-only flags, sorted
    pub fn local_only_names(&self) -> impl Iterator<Item = &str> {
        self.local_only.iter().map(String::as_str)
    }

    /// Annotated flags and their completions, sorted by name
    pub fn completions(&self) -> Vec<(&str, &ValueCompletion)> {
        let mut entries: Vec<_> = self
            .completions
            .iter()
            .map(|(name, completion)| (name.as_str(), completion))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// `--name` and, when present, `-s`
fn flag_names(flag: &FlagSpec) -> Vec<String> {
    let mut names = vec![format!("{FLAG_MARKER}{FLAG_MARKER}{}", flag.name)];
    if let Some(short) = flag.shorthand {
        names.push(format!("{FLAG_MARKER}{short}"));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_name_strips_marker() {
        assert_eq!(flag_name("--file="), "--file");
        assert_eq!(flag_name("--verbose"), "--verbose");
        assert_eq!(flag_name("-f="), "-f");
    }

    #[test]
    fn test_split_flag_word() {
        assert_eq!(split_flag_word("--file=a.txt"), ("--file", Some("a.txt")));
        assert_eq!(split_flag_word("--file="), ("--file", Some("")));
        assert_eq!(split_flag_word("--file"), ("--file", None));
        assert_eq!(split_flag_word("-"), ("-", None));
        assert_eq!(split_flag_word("--a=b=c"), ("--a", Some("b=c")));
    }

    #[test]
    fn test_tokens_sorted_with_value_marker() {
        let own = vec![
            FlagSpec::value("output").short('o'),
            FlagSpec::boolean("all").short('A'),
        ];
        let table = FlagTable::classify(&own, &[]);

        assert_eq!(table.all_tokens(), ["--all", "-A", "--output=", "-o="]);
        assert!(table.takes_separate_value("--output"));
        assert!(table.takes_separate_value("-o"));
        assert!(!table.takes_separate_value("--all"));
    }

    #[test]
    fn test_hidden_and_deprecated_flags_excluded() {
        let own = vec![
            FlagSpec::boolean("secret").hidden(),
            FlagSpec::value("old").deprecated("gone").required(),
            FlagSpec::boolean("shown"),
        ];
        let table = FlagTable::classify(&own, &[]);

        assert_eq!(table.all_tokens(), ["--shown"]);
        assert!(table.required_tokens().is_empty());
    }

    #[test]
    fn test_local_only_excludes_inherited_scope() {
        let own = vec![
            FlagSpec::boolean("local"),
            FlagSpec::boolean("persistent").inherited(),
        ];
        let ancestors = vec![FlagSpec::boolean("global").inherited()];
        let table = FlagTable::classify(&own, &ancestors);

        assert!(table.is_local_only("--local"));
        assert!(!table.is_local_only("--persistent"));
        assert!(!table.is_local_only("--global"));
        assert_eq!(table.all_tokens(), ["--global", "--local", "--persistent"]);
    }

    #[test]
    fn test_required_only_from_own_flags() {
        let own = vec![
            FlagSpec::value("zone").required(),
            FlagSpec::boolean("all").short('a').required(),
        ];
        let ancestors = vec![FlagSpec::value("project").inherited().required()];
        let table = FlagTable::classify(&own, &ancestors);

        assert_eq!(table.required_tokens(), ["--all", "--zone=", "-a"]);
    }

    #[test]
    fn test_completions_keyed_by_long_and_short_name() {
        let own = vec![
            FlagSpec::value("file")
                .short('f')
                .completion(ValueCompletion::filenames(["txt"])),
        ];
        let table = FlagTable::classify(&own, &[]);

        assert_eq!(
            table.value_completion("--file"),
            Some(&ValueCompletion::filenames(["txt"]))
        );
        assert_eq!(
            table.value_completion("-f"),
            Some(&ValueCompletion::filenames(["txt"]))
        );
        assert!(table.value_completion("--file=").is_none());
        assert_eq!(table.completions().len(), 2);
    }

    #[test]
    fn test_own_flag_shadows_inherited() {
        let own = vec![FlagSpec::boolean("config")];
        let ancestors = vec![FlagSpec::value("config").inherited()];
        let table = FlagTable::classify(&own, &ancestors);

        assert_eq!(table.all_tokens(), ["--config"]);
        assert!(!table.takes_separate_value("--config"));
    }
}
