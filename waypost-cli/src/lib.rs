//! Command-line interface for querying routing engines.
//!
//! Subcommand options merge from CLI flags, configuration files, and
//! `WAYPOST_`-prefixed environment variables before validation, so an API
//! key can live in the environment while points arrive on the command line.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod commands;
mod error;

pub use error::CliError;

use commands::{DirectionsArgs, IsochronesArgs, MatrixArgs};

const ARG_API_KEY: &str = "api-key";
const ARG_BASE_URL: &str = "base-url";
const ARG_CENTER: &str = "center";
const ARG_PROFILE: &str = "profile";
const ENV_DIRECTIONS_API_KEY: &str = "WAYPOST_CMDS_DIRECTIONS_API_KEY";
const ENV_ISOCHRONES_API_KEY: &str = "WAYPOST_CMDS_ISOCHRONES_API_KEY";
const ENV_ISOCHRONES_CENTER: &str = "WAYPOST_CMDS_ISOCHRONES_CENTER";
const ENV_MATRIX_API_KEY: &str = "WAYPOST_CMDS_MATRIX_API_KEY";

/// Run the Waypost CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when argument parsing, configuration merging, the
/// provider call, or output writing fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Directions(args) => commands::run_directions(args),
        Command::Isochrones(args) => commands::run_isochrones(args),
        Command::Matrix(args) => commands::run_matrix(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waypost",
    about = "Query a routing engine for directions, isochrones, and matrices",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Route through the given points.
    Directions(DirectionsArgs),
    /// Compute reachability polygons around a centre.
    Isochrones(IsochronesArgs),
    /// Compute travel time and distance matrices.
    Matrix(MatrixArgs),
}

#[cfg(test)]
mod tests;
