use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use log::info;
use regex_dfa_transformer::regex::{display_tokens, to_postfix};
use regex_dfa_transformer::{compile_with, CompileConfig, Dfa};

const USAGE: &str = "\
usage: regex_dfa [OPTIONS] <REGEX> [INPUT]...

Compiles REGEX (concatenation, '|', '*' and parentheses) to a DFA and tests
each INPUT against it. Without inputs, strings are read from stdin one per
line until 'exit' or end of input.

options:
    --max-len N      reject regexes longer than N characters
    --max-states N   give up when the DFA needs more than N states
    -q, --quiet      do not print the postfix form and DFA table
    -h, --help       print this message";

#[derive(Debug, PartialEq)]
struct Args {
    regex: String,
    inputs: Vec<String>,
    config: CompileConfig,
    quiet: bool,
}

/// `Ok(None)` means help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<Args>> {
    let mut config = CompileConfig::default();
    let mut quiet = false;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-q" | "--quiet" => quiet = true,
            "--max-len" | "--max-states" => {
                let value = args.next().with_context(|| format!("{arg} needs a value"))?;
                let n: usize = value
                    .parse()
                    .with_context(|| format!("invalid value for {arg}: {value:?}"))?;
                config = if arg == "--max-len" {
                    config.with_max_regex_len(n)
                }
                else {
                    config.with_max_dfa_states(n)
                };
            }
            "--" => {
                positional.extend(args.by_ref());
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(regex) = positional.next() else {
        bail!("missing REGEX\n\n{USAGE}");
    };

    Ok(Some(Args {
        regex,
        inputs: positional.collect(),
        config,
        quiet,
    }))
}

fn verdict(dfa: &Dfa, input: &str) -> &'static str {
    if dfa.accepts(input) { "accepted" } else { "rejected" }
}

/// Tests one string per line until `exit` or end of input.
fn repl(dfa: &Dfa, input: impl BufRead, mut output: impl Write) -> Result<()> {
    for line in input.lines() {
        let line = line.context("failed to read input")?;
        let s = line.trim_end_matches('\r');
        if s.trim().eq_ignore_ascii_case("exit") {
            break;
        }
        writeln!(output, "{s:?}: {}", verdict(dfa, s))?;
        output.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let dfa = compile_with(&args.regex, &args.config)
        .with_context(|| format!("failed to compile {:?}", args.regex))?;
    info!("compiled {:?} to {} DFA states", args.regex, dfa.len());

    if !args.quiet {
        // compile_with already validated the regex
        let postfix = to_postfix(&args.regex)?;
        println!("postfix:   {}", display_tokens(&postfix));
        println!("alphabet:  {}", dfa.alphabet().iter().collect::<String>());
        println!("states:    {}", dfa.len());
        println!();
        print!("{dfa}");
        println!();
    }

    if args.inputs.is_empty() {
        repl(&dfa, io::stdin().lock(), io::stdout().lock())
    }
    else {
        for input in &args.inputs {
            println!("{input:?}: {}", verdict(&dfa, input));
        }
        Ok(())
    }
}
