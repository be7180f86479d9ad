//! Command implementations.

pub mod ast;
pub mod check;
pub mod tokens;

use clap::ArgMatches;
use sigil_compiler::Frontend;
use sigil_core::{Diagnostics, DiagnosticsPrinter, Interner};

/// Build a front-end from the syntax file named on the command line and
/// read the source file. Fatal problems print to stderr and yield exit 1.
pub(crate) fn frontend_from_args(
    matches: &ArgMatches,
) -> Result<(Frontend, String, String, Diagnostics), i32> {
    let syntax_path = matches.get_one::<String>("syntax").expect("required arg");
    let source_path = matches.get_one::<String>("source").expect("required arg");

    let mut diag = Diagnostics::new();
    let frontend = match Frontend::from_syntax_file(syntax_path, &mut diag) {
        Ok(frontend) => frontend,
        Err(err) => {
            eprintln!("{err}");
            return Err(1);
        }
    };

    let source = match std::fs::read_to_string(source_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {source_path}: {err}");
            return Err(1);
        }
    };

    Ok((frontend, source_path.clone(), source, diag))
}

/// Flush diagnostics to stderr; exit 1 iff any error or fatal was emitted.
/// Warnings do not change the exit status.
pub(crate) fn finish(diag: &Diagnostics, interner: &Interner, source: Option<&str>) -> i32 {
    if !diag.is_empty() {
        let mut printer = DiagnosticsPrinter::new(diag, interner);
        if let Some(source) = source {
            printer = printer.source(source);
        }
        eprint!("{}", printer.render());
    }
    if diag.has_errors() { 1 } else { 0 }
}
