mod cli;
mod commands;

use cli::build_cli;

fn main() {
    let matches = build_cli().get_matches();

    let code = match matches.subcommand() {
        Some(("tokens", m)) => commands::tokens::run(m),
        Some(("ast", m)) => commands::ast::run(m),
        Some(("check", m)) => commands::check::run(m),
        _ => unreachable!("clap should have caught this"),
    };

    std::process::exit(code);
}
