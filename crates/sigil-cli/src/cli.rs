//! Command-line definition.

use clap::{Arg, ArgAction, Command};

fn file_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("syntax")
            .required(true)
            .value_name("SYNTAX_FILE")
            .help("Syntax-rule file governing the lexer"),
    )
    .arg(
        Arg::new("source")
            .required(true)
            .value_name("SOURCE_FILE")
            .help("Source file to process"),
    )
}

pub fn build_cli() -> Command {
    Command::new("sigil")
        .about("Front-end for the sigil language")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(file_args(
            Command::new("tokens").about("Tokenize a source file and print the token stream"),
        ))
        .subcommand(
            file_args(Command::new("ast").about("Parse a source file and print the operator tree"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit the tree as JSON"),
                ),
        )
        .subcommand(file_args(
            Command::new("check")
                .about("Type-check a source file and print the declared bindings"),
        ))
}
