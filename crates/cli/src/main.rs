// srecon - servant name reconciliation from the command line

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use servant_recon::expand::expand;
use servant_recon::{Normalizer, Overrides};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "srecon")]
#[command(about = "Reconcile wiki servant names against a target catalog")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the matching cascade from a TOML config file
    #[command(after_help = "\
Examples:
  srecon run fgo.recon.toml
  srecon run fgo.recon.toml --json
  srecon run fgo.recon.toml --output report.json --strict")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when any entity stays unmatched
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  srecon validate fgo.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Show the normalized form and match variants of names
    #[command(after_help = "\
Examples:
  srecon normalize '阿尔托莉雅・潘德拉贡〔Alter〕'
  srecon normalize 阿育王AshokaAshoka --json
  srecon normalize 所罗门 --alias 罗曼")]
    Normalize {
        /// Names to normalize
        #[arg(required = true)]
        names: Vec<String>,

        /// Alias to expand alongside each name (repeatable)
        #[arg(long = "alias")]
        aliases: Vec<String>,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Trace the cascade for one entity
    #[command(after_help = "\
Examples:
  srecon explain fgo.recon.toml 伊斯坎达尔
  srecon explain fgo.recon.toml BB --json")]
    Explain {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Source name; looked up in the entity collection, else matched bare
        name: String,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  servant-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output, strict } => recon::cmd_run(config, json, output, strict),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Normalize { names, aliases, json } => cmd_normalize(names, aliases, json),
        Commands::Explain { config, name, json } => recon::cmd_explain(config, name, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct NormalizedName {
    input: String,
    normalized: String,
    variants: Vec<String>,
}

fn cmd_normalize(names: Vec<String>, aliases: Vec<String>, json: bool) -> Result<(), CliError> {
    let normalizer = Normalizer::from_overrides(&Overrides::default());
    let rows: Vec<NormalizedName> = names
        .into_iter()
        .map(|name| {
            let variants = expand(&normalizer, &name, &aliases);
            NormalizedName {
                normalized: normalizer.normalize(&name),
                variants: variants.as_slice().to_vec(),
                input: name,
            }
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&rows).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{out}");
        return Ok(());
    }

    for row in &rows {
        println!("{}", row.normalized);
        for variant in &row.variants {
            println!("  {variant}");
        }
    }
    Ok(())
}
