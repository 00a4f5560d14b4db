// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::result::Result as StdResult;

use pico_args::Arguments;

use femir_core::ExitStatus;
use femir_engine::FinalizedModel;
use femir_engine::json;

const VERSION: &str = "1.0";

macro_rules! die(
    ($status:expr, $($arg:tt)*) => { {
        eprintln!($($arg)*);
        std::process::exit(($status).code())
    } }
);

fn usage() -> ! {
    let argv0 = std::env::args()
        .next()
        .unwrap_or_else(|| "femir".to_string());
    die!(
        ExitStatus::InvalidInvocation,
        concat!(
            "femir {}: Check and dump finite-element model decks.\n\
         \n\
         USAGE:\n",
            "    {} [SUBCOMMAND] [OPTION...] PATH\n",
            "\n\
         OPTIONS:\n",
            "    -h, --help       show this message\n",
            "    --output FILE    path to write the dump to\n",
            "\n\
         SUBCOMMANDS:\n",
            "    check            Parse a JSON deck and finalize it, reporting every error\n",
            "    dump             Finalize a deck and print its derived state as JSON\n",
        ),
        VERSION,
        argv0
    );
}

#[derive(Clone, Default, Debug)]
struct Args {
    path: Option<String>,
    output: Option<String>,
    is_dump: bool,
}

fn parse_args() -> StdResult<Args, Box<dyn std::error::Error>> {
    let mut parsed = Arguments::from_env();
    if parsed.contains(["-h", "--help"]) {
        usage();
    }

    let subcommand = match parsed.subcommand()? {
        Some(subcommand) => subcommand,
        None => {
            eprintln!("error: subcommand required");
            usage();
        }
    };

    let mut args: Args = Default::default();

    if subcommand == "check" {
    } else if subcommand == "dump" {
        args.is_dump = true;
    } else {
        eprintln!("error: unknown subcommand {subcommand}");
        usage();
    }

    args.output = parsed.value_from_str("--output").ok();

    let free_arguments = parsed.finish();
    if free_arguments.is_empty() {
        eprintln!("error: input path required");
        usage();
    }

    args.path = free_arguments[0].to_str().map(|s| s.to_owned());

    Ok(args)
}

/// Read, parse, and finalize a deck, dying with the matching exit status
/// at the first step that fails.
fn finalize_deck(path: &str) -> FinalizedModel {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => die!(ExitStatus::NoInputFile, "error: cannot read '{path}': {err}"),
    };
    let deck = match json::Deck::from_reader(BufReader::new(file)) {
        Ok(deck) => deck,
        Err(err) => die!(ExitStatus::ReadFormatError, "error: {err}"),
    };
    let model = match json::deck_to_model(deck) {
        Ok(model) => model,
        Err(err) => die!(ExitStatus::from_error(&err), "error: {err}"),
    };
    match model.finalize() {
        Ok(finalized) => finalized,
        Err(rejected) => {
            for err in rejected.errors() {
                eprintln!("error: {err}");
            }
            std::process::exit(ExitStatus::ModelValidationError.code())
        }
    }
}

fn dump(finalized: &FinalizedModel, output: Option<String>) {
    let summary = json::summarize(finalized);
    let text = match serde_json::to_string_pretty(&summary) {
        Ok(text) => text,
        Err(err) => die!(ExitStatus::WriteFormatError, "error: {err}"),
    };

    match output {
        Some(path) => {
            if let Some(dir) = Path::new(&path).parent()
                && !dir.as_os_str().is_empty()
                && !dir.is_dir()
            {
                die!(
                    ExitStatus::OutputDirUnavailable,
                    "error: output directory '{}' does not exist",
                    dir.display()
                );
            }
            if let Err(err) = fs::write(&path, text) {
                die!(
                    ExitStatus::WriteFormatError,
                    "error: cannot write '{path}': {err}"
                );
            }
        }
        None => println!("{text}"),
    }
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            usage();
        }
    };
    let file_path = args.path.unwrap_or_else(|| "/dev/stdin".to_string());
    let finalized = finalize_deck(&file_path);

    if args.is_dump {
        dump(&finalized, args.output);
    } else {
        let model = finalized.model();
        println!(
            "ok: {} ({} nodes, {} cells, {} equations)",
            file_path,
            model.mesh.nodes.len(),
            model.mesh.cells.len(),
            finalized.dof_numbering().len()
        );
    }
}
