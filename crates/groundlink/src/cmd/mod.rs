use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand};
use groundlink_registry::Registry;
use tracing::debug;

use crate::exit::{registry_error, CliResult};
use crate::output::OutputFormat;

pub mod catalog;
pub mod console;
pub mod decode;
pub mod encode;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the vehicle and read operator commands from stdin.
    Run(RunArgs),
    /// List the variable catalog.
    Catalog(CatalogArgs),
    /// Encode one update and print its frame.
    Encode(EncodeArgs),
    /// Decode a hex buffer of frames.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Catalog(args) => catalog::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Load `path`, or the built-in reference catalog.
pub fn load_registry(path: Option<&Path>) -> CliResult<Arc<Registry>> {
    let registry = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading catalog");
            Registry::from_path(path).map_err(|err| registry_error("catalog", err))?
        }
        None => Registry::reference(),
    };
    Ok(Arc::new(registry))
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serial link, highest priority first; repeat for backups
    /// (e.g. "/dev/ttyACM0,baud=115200,readTimeout=100ms").
    #[arg(long = "serial", value_name = "LINK")]
    pub serial: Vec<String>,
    /// Also connect over Bluetooth LE, after the serial links.
    #[cfg(feature = "ble")]
    #[arg(long)]
    pub ble: bool,
    /// Catalog JSON file. Default: built-in reference catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
    /// Pause between reconnect attempts (e.g. 250ms, 1s).
    #[arg(long, default_value = "250ms")]
    pub retry: String,
    /// Upper bound on one wireless write (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub write_timeout: String,
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog JSON file. Default: built-in reference catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
    /// Only list this group.
    #[arg(long)]
    pub group: Option<String>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Variable as group.name.
    pub variable: String,
    /// Value to set. Omit to encode a query.
    #[arg(allow_hyphen_values = true)]
    pub value: Option<String>,
    /// Catalog JSON file. Default: built-in reference catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded buffer of one or more frames.
    pub hex: String,
    /// Catalog JSON file. Default: built-in reference catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
