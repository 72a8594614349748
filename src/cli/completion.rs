//! Shell completion generation
//!
//! Two kinds of scripts come out of here: the clap_complete script for
//! comptree's own arguments, and bash glue that makes another program
//! complete through `comptree complete` and a grammar file.

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::Write;
use std::path::Path;

use crate::cli::CliArgs;
use crate::error::{ConfigError, Result};

/// Generate a completion script
///
/// # Arguments
/// * `shell_name` - Shell type
/// * `target` - Program name and grammar file to emit glue for; `None`
///   completes comptree itself
/// * `out` - Where the script is written
pub fn generate_completion<W: Write>(
    shell_name: &str,
    target: Option<(&str, &Path)>,
    out: &mut W,
) -> Result<()> {
    let shell = parse_shell(shell_name)?;

    match (shell, target) {
        (shell, None) => {
            let mut cmd = CliArgs::command();
            generate(shell, &mut cmd, "comptree", out);
            Ok(())
        }
        (Shell::Bash, Some((program, grammar))) => {
            out.write_all(bash_glue(program, grammar).as_bytes())?;
            Ok(())
        }
        (_, Some(_)) => Err(ConfigError::Generic(
            "Program completion is only available for bash".to_string(),
        )
        .into()),
    }
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        "powershell" => Ok(Shell::PowerShell),
        "elvish" => Ok(Shell::Elvish),
        _ => Err(ConfigError::Generic(format!(
            "Unsupported shell: {}. Supported shells: bash, zsh, fish, powershell, elvish",
            shell_name
        ))
        .into()),
    }
}

/// Bash function forwarding the words being completed to comptree
fn bash_glue(program: &str, grammar: &Path) -> String {
    let function: String = program
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let grammar = shell_quote(&grammar.display().to_string());
    let program_word = shell_quote(program);

    format!(
        r#"# bash completion for {program} (generated by comptree)

__{function}_comptree_complete()
{{
    local words cword
    if declare -F _get_comp_words_by_ref >/dev/null 2>&1; then
        _get_comp_words_by_ref -n "=:" -w words -i cword
    else
        # COMP_WORDS splits `--flag=value` at `=`; glue the pieces back
        words=()
        cword=0
        local i n word
        for ((i = 0; i < ${{#COMP_WORDS[@]}}; i++)); do
            word=${{COMP_WORDS[i]}}
            n=${{#words[@]}}
            if (( n > 0 )) && {{
                [[ $word == "=" && ${{words[n-1]}} == -* && ${{words[n-1]}} != *=* ]] ||
                [[ ${{COMP_WORDS[i-1]}} == "=" && ${{words[n-1]}} == -*= ]]
            }}; then
                words[n-1]+=$word
            else
                words+=("$word")
            fi
            if (( i == COMP_CWORD )); then
                cword=$(( ${{#words[@]}} - 1 ))
            fi
        done
    fi

    local IFS=$'\n'
    COMPREPLY=($(comptree complete --grammar {grammar} --cword "$cword" -- "${{words[@]}}" 2>/dev/null))

    # bash replaces only the lone `=` word; keep it in front of the values
    if [[ ${{COMP_WORDS[COMP_CWORD]}} == "=" ]]; then
        COMPREPLY=("${{COMPREPLY[@]/#/=}}")
    fi

    if [[ ${{#COMPREPLY[@]}} -eq 1 && ( ${{COMPREPLY[0]}} == *= || ${{COMPREPLY[0]}} == */ ) ]]; then
        compopt -o nospace 2>/dev/null
    fi
}}

complete -o default -F __{function}_comptree_complete {program_word}
"#
    )
}

/// Single-quote `text` for bash
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
