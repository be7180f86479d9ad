//! `sigil ast`: print the operator tree.

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

            if matches.get_flag("json") {
                let dump = output.ast.to_dump(frontend.interner());
                match serde_json::to_string_pretty(&dump) {
                    Ok(json) => println!("{json}"),
                    Err(err) => {
                        eprintln!("failed to serialize tree: {err}");
                        return 1;
                    }
                }
            } else {
                print!("{}", output.ast.dump(frontend.interner()));
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
