//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Command-line validator for JSON instance data against a YANG data
//! model.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, ValueEnum};

use yangson::context::{Context, FileLoader};
use yangson::schema::{ContentType, ValidationScope};
use yangson::Error;

#[derive(Parser)]
#[command(
    name = "yangson",
    about = "Validate JSON data against a YANG data model.",
    version,
    group(ArgGroup::new("action").args(["id", "tree", "digest", "validate"]))
)]
struct Cli {
    /// File with the JSON-encoded YANG library description of the data
    /// model (RFC 7895).
    #[arg(value_name = "YLIB")]
    ylib: PathBuf,

    /// Colon-separated list of directories to search for YANG modules.
    #[arg(short, long, default_value = ".")]
    path: String,

    /// Print the module set id.
    #[arg(short, long)]
    id: bool,

    /// Print the schema tree as ASCII art.
    #[arg(short, long)]
    tree: bool,

    /// Print the schema digest in JSON format.
    #[arg(short, long)]
    digest: bool,

    /// File with JSON-encoded instance data to validate.
    #[arg(short, long, value_name = "INST")]
    validate: Option<PathBuf>,

    /// Validation scope.
    #[arg(short, long, value_enum, default_value_t = ScopeArg::All)]
    scope: ScopeArg,

    /// Content type of the data instance.
    #[arg(short, long, value_enum, default_value_t = CtypeArg::Config)]
    ctype: CtypeArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Syntax,
    Semantics,
    All,
}

impl From<ScopeArg> for ValidationScope {
    fn from(arg: ScopeArg) -> ValidationScope {
        match arg {
            ScopeArg::Syntax => ValidationScope::SYNTAX,
            ScopeArg::Semantics => ValidationScope::SEMANTICS,
            ScopeArg::All => ValidationScope::ALL,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CtypeArg {
    Config,
    Nonconfig,
    All,
}

impl From<CtypeArg> for ContentType {
    fn from(arg: CtypeArg) -> ContentType {
        match arg {
            CtypeArg::Config => ContentType::Config,
            CtypeArg::Nonconfig => ContentType::Nonconfig,
            CtypeArg::All => ContentType::All,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    ExitCode::from(run(&cli))
}

fn run(cli: &Cli) -> u8 {
    // I/O and JSON-decoding problems of the YANG library exit with 1;
    // an invalid library exits with 2.
    let ylib_text = match std::fs::read_to_string(&cli.ylib) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("YANG library: {}", e);
            return 1;
        }
    };
    let ylib: serde_json::Value = match serde_json::from_str(&ylib_text) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("YANG library: {}", e);
            return 1;
        }
    };

    let loader = FileLoader::new(cli.path.split(':'));
    let context = match Context::from_yang_library(&ylib, &loader) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("{}", e);
            return 2;
        }
    };

    if cli.id {
        println!("{}", context.module_set_id());
        return 0;
    }
    if cli.tree {
        print!("{}", context.ascii_tree());
        return 0;
    }
    if cli.digest {
        println!("{}", context.schema_digest());
        return 0;
    }
    let Some(instance_file) = &cli.validate else {
        return 0;
    };

    // Invalid instance data exits with 3.
    let instance_text = match std::fs::read_to_string(instance_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Instance data: {}", e);
            return 1;
        }
    };
    let raw: serde_json::Value = match serde_json::from_str(&instance_text)
    {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Instance data: {}", e);
            return 1;
        }
    };

    let instance = match context.from_raw(&raw) {
        Ok(instance) => instance,
        Err(e @ (Error::RawMember { .. } | Error::RawType { .. })) => {
            eprintln!("{}", e);
            return 3;
        }
        Err(e) => {
            eprintln!("{}", e);
            return 2;
        }
    };
    if let Err(e) =
        instance.validate(cli.scope.into(), cli.ctype.into())
    {
        eprintln!("{}", e);
        return 3;
    }
    0
}
