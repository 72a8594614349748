//! End-to-end completion behaviour

use std::fs::File;
use std::sync::{Arc, Mutex};

use super::*;
use crate::error::Result;
use crate::grammar::{CommandSpec, CommandTree, FlagSpec, ValueCompletion};

/// Value completer that records its calls
#[derive(Default)]
struct RecordingCompleter {
    calls: Mutex<Vec<(ValueCompletion, String)>>,
    answer: Vec<String>,
}

impl ValueCompleter for RecordingCompleter {
    fn complete(&self, completion: &ValueCompletion, partial: &str) -> Result<Vec<String>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((completion.clone(), partial.to_string()));
        }
        Ok(self.answer.clone())
    }
}

struct StaticHook(Vec<&'static str>);

impl CompletionHook for StaticHook {
    fn complete(&self, context: &HookContext<'_>) -> Result<Vec<String>> {
        Ok(self
            .0
            .iter()
            .filter(|v| v.starts_with(context.current))
            .map(|v| v.to_string())
            .collect())
    }
}

fn kubectl() -> CommandSpec {
    CommandSpec::new("kubectl")
        .flag(FlagSpec::boolean("verbose").short('v').inherited())
        .flag(FlagSpec::value("context").inherited())
        .flag(FlagSpec::value("kubeconfig").required())
        .subcommand(
            CommandSpec::new("get")
                .alias("g")
                .valid_args(["pods", "services"])
                .arg_aliases(["po", "svc"])
                .flag(FlagSpec::value("output").short('o'))
                .flag(FlagSpec::boolean("all-namespaces").short('A'))
                .flag(FlagSpec::boolean("watch").short('w').inherited()),
        )
        .subcommand(
            CommandSpec::new("config")
                .flag(FlagSpec::boolean("raw"))
                .subcommand(CommandSpec::new("view"))
                .subcommand(CommandSpec::new("use-context").alias("use")),
        )
        .subcommand(
            CommandSpec::new("apply")
                .flag(
                    FlagSpec::value("filename")
                        .short('f')
                        .required()
                        .completion(ValueCompletion::filenames(["yaml", "json"])),
                )
                .flag(FlagSpec::value("selector").required()),
        )
        .subcommand(CommandSpec::new("debug").hidden())
}

fn engine_for(spec: &CommandSpec, completer: Arc<RecordingCompleter>) -> CompletionEngine {
    let tree = Arc::new(CommandTree::build(spec).unwrap());
    CompletionEngine::new(tree, completer)
}

fn complete(engine: &CompletionEngine, typed: &[&str], current: &str) -> Vec<String> {
    engine
        .complete(&CompletionRequest::new(typed.iter().copied(), current))
        .values()
        .into_iter()
        .map(String::from)
        .collect()
}

#[test]
fn test_empty_line_offers_root_children_then_required_flags() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert_eq!(
        complete(&engine, &[], ""),
        vec!["get", "config", "apply", "--kubeconfig="]
    );
}

#[test]
fn test_chain_of_children_offers_children_and_requirements() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert_eq!(complete(&engine, &["config"], ""), vec!["view", "use-context"]);
    assert_eq!(complete(&engine, &["config"], "u"), vec!["use-context"]);
    assert_eq!(complete(&engine, &["get"], ""), vec!["pods", "services"]);
    assert_eq!(
        complete(&engine, &["apply"], ""),
        vec!["--filename=", "--selector=", "-f="]
    );
}

#[test]
fn test_hidden_commands_never_offered_or_entered() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert!(complete(&engine, &[], "d").is_empty());

    // "debug" is a positional at the root
    let state = engine.walk(&CompletionRequest::new(["debug"], ""));
    assert_eq!(state.node, engine.tree().root());
    assert_eq!(state.nouns, ["debug"]);
}

#[test]
fn test_required_flag_group_cleared_by_one_member() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert_eq!(
        complete(&engine, &["apply", "--selector=app"], "-"),
        vec![
            "--context=",
            "--filename=",
            "-f=",
            "--selector=",
            "--verbose",
            "-v"
        ]
    );
    // once satisfied, neither member is offered as a requirement
    let got = complete(&engine, &["apply", "--selector", "app"], "");
    assert!(got.is_empty());
    let got = complete(&engine, &["apply", "-f", "a.yaml"], "--s");
    assert_eq!(got, vec!["--selector="]);
}

#[test]
fn test_required_flags_restrict_flag_candidates_until_satisfied() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert_eq!(
        complete(&engine, &["apply"], "-"),
        vec!["--filename=", "--selector=", "-f="]
    );
    assert_eq!(
        complete(&engine, &["apply", "-f", "a.yaml"], "--"),
        vec!["--context=", "--filename=", "--selector=", "--verbose"]
    );
}

#[test]
fn test_local_flag_suppresses_only_subcommands() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert!(complete(&engine, &["config", "--raw"], "").is_empty());
    assert_eq!(complete(&engine, &["config", "--raw"], "--r"), vec!["--raw"]);
    // inherited flags leave subcommands alone
    assert_eq!(
        complete(&engine, &["config", "-v"], ""),
        vec!["view", "use-context"]
    );
}

#[test]
fn test_local_flag_keeps_positionals() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert_eq!(
        complete(&engine, &["get", "-o", "wide"], ""),
        vec!["pods", "services"]
    );
}

#[test]
fn test_alias_has_the_same_effect_as_the_name() {
    let engine = engine_for(&kubectl(), Arc::default());
    for current in ["", "p", "-", "--o"] {
        assert_eq!(
            complete(&engine, &["g"], current),
            complete(&engine, &["get"], current)
        );
    }
    assert_eq!(
        engine.walk(&CompletionRequest::new(["config", "use"], "")),
        engine.walk(&CompletionRequest::new(["config", "use-context"], ""))
    );
}

#[test]
fn test_alias_of_a_non_child_is_a_positional() {
    let engine = engine_for(&kubectl(), Arc::default());
    let state = engine.walk(&CompletionRequest::new(["get", "use"], ""));
    assert_eq!(engine.tree().path(state.node), "kubectl get");
}

#[test]
fn test_required_flags_reset_on_descent() {
    let spec = CommandSpec::new("root")
        .flag(FlagSpec::boolean("x").required())
        .subcommand(CommandSpec::new("sub-a"))
        .subcommand(CommandSpec::new("sub-b").alias("b"));
    let engine = engine_for(&spec, Arc::default());

    assert_eq!(complete(&engine, &[], ""), vec!["sub-a", "sub-b", "--x"]);
    assert!(complete(&engine, &["sub-b"], "").is_empty());
    assert!(complete(&engine, &["b"], "").is_empty());
}

#[test]
fn test_boolean_flag_consumes_one_word() {
    let spec = CommandSpec::new("root")
        .flag(FlagSpec::boolean("verbose"))
        .flag(FlagSpec::boolean("version"))
        .flag(FlagSpec::value("name").short('n'));
    let engine = engine_for(&spec, Arc::default());

    assert_eq!(
        complete(&engine, &["--verbose"], "--"),
        vec!["--name=", "--verbose", "--version"]
    );
}

#[test]
fn test_annotated_two_word_flag_delegates_to_completer() {
    let spec = CommandSpec::new("root")
        .flag(FlagSpec::value("file").completion(ValueCompletion::filenames(["txt"])))
        .subcommand(CommandSpec::new("child"));
    let completer = Arc::new(RecordingCompleter {
        answer: vec!["a.txt".to_string()],
        ..Default::default()
    });
    let engine = engine_for(&spec, completer.clone());

    assert_eq!(complete(&engine, &["--file"], ""), vec!["a.txt"]);
    let calls = completer.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![(ValueCompletion::filenames(["txt"]), String::new())]
    );
}

#[test]
fn test_completer_result_is_used_verbatim() {
    let spec = CommandSpec::new("root").flag(
        FlagSpec::value("file").completion(ValueCompletion::custom("anything")),
    );
    let completer = Arc::new(RecordingCompleter {
        answer: vec!["zeta".to_string(), "alpha".to_string()],
        ..Default::default()
    });
    let engine = engine_for(&spec, completer);

    // not prefix-filtered, not re-sorted
    assert_eq!(complete(&engine, &["--file"], "q"), vec!["zeta", "alpha"]);
    assert_eq!(complete(&engine, &[], "--file=q"), vec!["zeta", "alpha"]);
}

#[test]
fn test_unannotated_flag_value_has_no_candidates() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert!(complete(&engine, &["--context"], "").is_empty());
    assert!(complete(&engine, &["--context"], "g").is_empty());
    assert!(complete(&engine, &[], "--context=").is_empty());
}

#[test]
fn test_positional_aliases_are_a_fallback() {
    let engine = engine_for(&kubectl(), Arc::default());
    assert_eq!(complete(&engine, &["get"], "sv"), vec!["svc"]);
    assert_eq!(complete(&engine, &["get"], "po"), vec!["pods"]);
    assert!(complete(&engine, &["get", "pods"], "sv").is_empty());
}

#[test]
fn test_hook_runs_only_when_nothing_else_matches() {
    let tree = Arc::new(CommandTree::build(&kubectl()).unwrap());
    let engine = CompletionEngine::new(tree, Arc::new(RecordingCompleter::default()))
        .with_hook(Arc::new(StaticHook(vec!["nginx", "node-1"])));

    assert_eq!(complete(&engine, &["get", "pods"], "n"), vec!["nginx", "node-1"]);
    assert_eq!(complete(&engine, &["get"], "p"), vec!["pods"]);
    // the hook is not consulted for flags
    assert!(complete(&engine, &["get", "pods"], "--zzz").is_empty());
}

#[test]
fn test_filename_completion_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    File::create(dir.path().join("deploy.yaml")).unwrap();
    File::create(dir.path().join("notes.txt")).unwrap();
    std::fs::create_dir(dir.path().join("manifests")).unwrap();

    let tree = Arc::new(CommandTree::build(&kubectl()).unwrap());
    let engine = CompletionEngine::new(tree, Arc::new(DefaultValueCompleter::new(dir.path())));

    let got = engine.complete(&CompletionRequest::new(["apply", "-f"], ""));
    assert_eq!(got.values(), vec!["deploy.yaml", "manifests/"]);
    assert!(!got.candidates[0].no_space);
    assert!(got.candidates[1].no_space);

    let (start, got) = engine.complete_line("kubectl apply --filename=de", 27);
    assert_eq!(start, 25);
    assert_eq!(got.values(), vec!["deploy.yaml"]);
    assert_eq!(got.inline_prefix.as_deref(), Some("--filename="));

    // escaped blank in the value: the value still starts right after `=`
    File::create(dir.path().join("a b.yaml")).unwrap();
    let line = r"kubectl apply --filename=a\ b";
    let (start, got) = engine.complete_line(line, line.len());
    assert_eq!(start, 25);
    assert_eq!(got.values(), vec!["a b.yaml"]);
}

#[test]
fn test_local_flag_closes_node_to_descent() {
    let engine = engine_for(&kubectl(), Arc::default());
    let state = engine.walk(&CompletionRequest::new(["config", "--raw", "view"], ""));
    assert_eq!(engine.tree().path(state.node), "kubectl config");
    assert_eq!(state.nouns, ["view"]);
}
