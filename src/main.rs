mod config;
mod error;
mod executor;
mod hub;
mod intent;
mod inventory;
mod matcher;

use crate::config::Config;
use crate::error::{HeimdError, Result};
use crate::executor::{CommandExecutor, ExecutionResult};
use crate::intent::IntentParser;
use crate::inventory::FileHub;
use crate::matcher::FuzzyMatcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    match run() {
        Ok(result) => {
            println!("{}", result.message);
            std::process::exit(if result.success { 0 } else { 1 });
        }
        Err(e) => {
            eprintln!("heimd: {}", e);
            std::process::exit(2);
        }
    }
}

fn run() -> Result<ExecutionResult> {
    // A missing .env is fine; a broken one is not.
    match dotenvy::dotenv() {
        Ok(path) => eprintln!("heimd: loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => {
            return Err(HeimdError::EnvLoadError {
                path: PathBuf::from(".env"),
                source: e,
            })
        }
    }

    let args = CliArgs::parse();
    let cfg = load_config(args.config.as_deref())?;

    let inventory_path = args
        .inventory
        .or_else(|| cfg.inventory.path.as_ref().map(PathBuf::from))
        .ok_or(HeimdError::MissingFile {
            path: PathBuf::from("inventory.json"),
            kind: "inventory",
        })?;
    if !inventory_path.is_file() {
        return Err(HeimdError::MissingFile {
            path: inventory_path,
            kind: "inventory",
        });
    }
    let hub = Arc::new(FileHub::from_path(&inventory_path)?);

    let parser = IntentParser::with_aliases(&cfg.voice.alias_pairs());
    let matcher = FuzzyMatcher::with_fragments(&cfg.voice.extra_compound_fragments);

    let intent = parser.parse(&args.transcript);
    eprintln!("heimd: transcript {:?} -> {:?}", args.transcript, intent);

    let mut executor = CommandExecutor::with_matcher(hub, matcher);
    Ok(executor.execute(&intent))
}

struct CliArgs {
    config: Option<PathBuf>,
    inventory: Option<PathBuf>,
    transcript: String,
}

impl CliArgs {
    /// Minimal flag loop; anything unknown prints usage and exits.
    fn parse() -> Self {
        let mut config = None;
        let mut inventory = None;
        let mut words: Vec<String> = Vec::new();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => match args.next() {
                    Some(v) => config = Some(PathBuf::from(v)),
                    None => usage_and_exit("--config needs a path"),
                },
                "--inventory" => match args.next() {
                    Some(v) => inventory = Some(PathBuf::from(v)),
                    None => usage_and_exit("--inventory needs a path"),
                },
                "--help" | "-h" => usage_and_exit(""),
                other if other.starts_with('-') => {
                    usage_and_exit(&format!("unknown flag '{}'", other))
                }
                other => words.push(other.to_string()),
            }
        }

        if words.is_empty() {
            usage_and_exit("missing transcript");
        }

        Self {
            config,
            inventory,
            transcript: words.join(" "),
        }
    }
}

fn usage_and_exit(problem: &str) -> ! {
    if !problem.is_empty() {
        eprintln!("heimd: {}", problem);
    }
    eprintln!("usage: heimd [--config PATH] [--inventory PATH] TRANSCRIPT...");
    eprintln!("example: heimd --inventory zuhause.json mach licht an im wohnzimmer");
    std::process::exit(2);
}

/// Config file resolution: --config flag, then $HEIMD_CONFIG, then the XDG
/// location, then built-in defaults when no file exists anywhere.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => match std::env::var_os("HEIMD_CONFIG") {
            Some(p) => Some(PathBuf::from(p)),
            None => xdg::BaseDirectories::with_prefix("heimd")
                .map_err(|e| HeimdError::XdgError {
                    message: e.to_string(),
                })?
                .find_config_file("config.toml"),
        },
    };

    let Some(path) = path else {
        return Ok(Config::default());
    };
    if !path.is_file() {
        return Err(HeimdError::MissingFile {
            path,
            kind: "config",
        });
    }

    let s = std::fs::read_to_string(&path).map_err(|e| HeimdError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Config::from_toml_str(&s).map_err(|message| HeimdError::ParseError {
        path,
        kind: "toml",
        message,
    })
}
