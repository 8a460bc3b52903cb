// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Mode flags are checked by presence: arguments devloop does not know about
//! are ignored instead of aborting start-up (see [`CliArgs::parse_lenient`]).

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use crate::types::Modes;

/// Command-line arguments for `devloop`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "devloop",
    version,
    about = "Format, lint, test and (re)run a project whenever its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Compile before running, and run the compiled output.
    #[arg(long)]
    pub compile: bool,

    /// Compile only; never launch the program. Implies `--compile`.
    #[arg(long)]
    pub build: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Devloop.toml` in the current working directory, which may be
    /// absent.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Run the initial pass, wait for the program to exit, then exit.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved settings and the initial plan without executing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

const SWITCHES: &[&str] = &["--compile", "--build", "--once", "--dry-run"];

impl CliArgs {
    pub fn modes(&self) -> Modes {
        Modes::from_flags(self.compile, self.build)
    }

    /// Parse `args` (including the binary name) without ever failing on
    /// unknown or malformed arguments.
    ///
    /// `--help` and `--version` still print and exit. Anything clap rejects
    /// is retried with only the recognised arguments, and as a last resort
    /// the switches are read by presence alone.
    pub fn parse_lenient<I, T>(args: I) -> CliArgs
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        match CliArgs::try_parse_from(&args) {
            Ok(parsed) => return parsed,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                err.exit()
            }
            Err(_) => {}
        }

        let known = known_args(&args);
        CliArgs::try_parse_from(&known).unwrap_or_else(|_| CliArgs::from_presence(&args))
    }

    fn from_presence(args: &[OsString]) -> CliArgs {
        let has = |flag: &str| args.iter().skip(1).any(|a| a.to_str() == Some(flag));
        CliArgs {
            compile: has("--compile"),
            build: has("--build"),
            once: has("--once"),
            dry_run: has("--dry-run"),
            ..CliArgs::default()
        }
    }
}

/// The binary name plus every argument devloop understands, dropping the rest.
fn known_args(args: &[OsString]) -> Vec<OsString> {
    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    if let Some(bin) = iter.next() {
        kept.push(bin.clone());
    }

    while let Some(arg) = iter.next() {
        let Some(s) = arg.to_str() else {
            continue;
        };

        if SWITCHES.contains(&s) {
            kept.push(arg.clone());
            continue;
        }

        if let Some(value) = s.strip_prefix("--config=") {
            kept.push(OsString::from("--config"));
            kept.push(OsString::from(value));
        } else if s == "--config" {
            if let Some(value) = iter.next() {
                kept.push(arg.clone());
                kept.push(value.clone());
            }
        } else if let Some(value) = s.strip_prefix("--log-level=") {
            push_log_level(&mut kept, value);
        } else if s == "--log-level" {
            if let Some(value) = iter.next().and_then(|v| v.to_str()) {
                push_log_level(&mut kept, value);
            }
        }
    }

    kept
}

fn push_log_level(kept: &mut Vec<OsString>, value: &str) {
    if <LogLevel as ValueEnum>::from_str(value, true).is_ok() {
        kept.push(OsString::from("--log-level"));
        kept.push(OsString::from(value));
    }
}

/// Parse the process arguments leniently.
pub fn parse() -> CliArgs {
    CliArgs::parse_lenient(std::env::args_os())
}
