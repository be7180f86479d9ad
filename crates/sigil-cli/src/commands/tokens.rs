//! `sigil tokens`: print the token stream.

use clap::ArgMatches;

pub fn run(matches: &ArgMatches) -> i32 {
    let (mut frontend, source_path, source, mut diag) =
        match super::frontend_from_args(matches) {
            Ok(parts) => parts,
            Err(code) => return code,
        };

    let tokens = frontend.tokenize(&source_path, &source, &mut diag);
    for token in &tokens {
        println!(
            "{} ({}:{}): {}",
            frontend.interner().resolve(token.kind),
            token.span.line,
            token.span.col,
            token.text
        );
    }

    super::finish(&diag, frontend.interner(), Some(&source))
}
