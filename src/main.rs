//! Purpose: `celerite` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Results are JSON on stdout; errors are JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io;
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use celerite::api::{
    DEFAULT_TOKEN_LENGTH, Error, ErrorKind, KvStore, Racer, default_data_dir, query_param,
    query_params, random_token, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let exit_code = match run().await {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("celerite=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(err.to_string().trim().to_string()));
            }
        },
    };

    let data_dir = cli.dir.unwrap_or_else(default_data_dir);

    match cli.command {
        Command::Race { debug, urls } => {
            let racer = Racer::new()?;
            let reports = racer.race(&urls, debug).await;
            print_json(&json!({ "reports": reports }))?;
        }
        Command::Put {
            db,
            store,
            key,
            value,
        } => {
            let value = parse_value(&value);
            let kv = KvStore::new().with_root(data_dir);
            kv.put(&db, &store, &key, &value).await?;
            print_json(&json!({ "put": { "db": db, "store": store, "key": key } }))?;
        }
        Command::Get { db, store, key } => {
            let kv = KvStore::new().with_root(data_dir);
            let value: Option<Value> = kv.get(&db, &store, &key).await?;
            print_json(&json!({ "found": value.is_some(), "value": value }))?;
        }
        Command::Query { url, name } => match name {
            Some(name) => {
                let value = query_param(&url, &name)?;
                print_json(&json!({ "name": name, "value": value }))?;
            }
            None => {
                let params = query_params(&url)?;
                print_json(&json!({ "params": params }))?;
            }
        },
        Command::Token { length } => {
            println!("{}", random_token(length));
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "celerite", &mut io::stdout());
        }
    }

    Ok(RunOutcome::ok())
}

#[derive(Parser)]
#[command(
    name = "celerite",
    version,
    about = "Pick the fastest endpoint and keep small persistent state",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        help = "Data directory for named databases (default: ~/.celerite/stores)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Race candidate endpoints and report the fastest",
        after_help = r#"EXAMPLES
  $ celerite race https://a.example https://b.example
  $ celerite race --debug https://mirror1.example https://mirror2.example"#
    )]
    Race {
        #[arg(long, help = "Log one diagnostic line per probe")]
        debug: bool,
        #[arg(required = true, value_name = "URL", help = "Candidate endpoint URLs")]
        urls: Vec<String>,
    },
    #[command(about = "Store a value under a key")]
    Put {
        #[arg(help = "Database name")]
        db: String,
        #[arg(help = "Store name inside the database")]
        store: String,
        key: String,
        #[arg(help = "Value; parsed as JSON, stored as a plain string otherwise")]
        value: String,
    },
    #[command(about = "Fetch the value stored under a key")]
    Get {
        #[arg(help = "Database name")]
        db: String,
        #[arg(help = "Store name inside the database")]
        store: String,
        key: String,
    },
    #[command(about = "Print query parameters of a URL")]
    Query {
        url: String,
        #[arg(help = "Print only this parameter")]
        name: Option<String>,
    },
    #[command(about = "Generate a random alphanumeric token")]
    Token {
        #[arg(long, default_value_t = DEFAULT_TOKEN_LENGTH, help = "Token length")]
        length: usize,
    },
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_json(value: &Value) -> Result<(), Error> {
    let line = serde_json::to_string(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })?;
    println!("{line}");
    Ok(())
}

fn emit_error(err: &Error) {
    let value = json!({
        "error": {
            "kind": format!("{:?}", err.kind()),
            "message": err.to_string(),
        }
    });
    let line = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{line}");
}
