//! `sigil check`: type-check and print the declared bindings.

use clap::ArgMatches;
use sigil_compiler::Error;

pub fn run(matches: &ArgMatches) -> i32 {
    let (mut frontend, source_path, source, mut diag) =
        match super::frontend_from_args(matches) {
            Ok(parts) => parts,
            Err(code) => return code,
        };

    match frontend.compile(&source_path, &source) {
        Ok((output, unit_diag)) => {
            diag.extend(unit_diag);

            for (name, ty) in output.types.current_vars() {
                println!(
                    "{}: {}",
                    frontend.interner().resolve(name),
                    ty.display(frontend.interner())
                );
            }

            super::finish(&diag, frontend.interner(), Some(&source))
        }
        Err(Error::ParseFailed(unit_diag)) => {
            diag.extend(unit_diag);
            super::finish(&diag, frontend.interner(), Some(&source));
            1
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}
