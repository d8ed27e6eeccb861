// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and output-path derivation.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

pub const VERSION: &str = "0.4.0";

const LONG_ABOUT: &str = "DataCode1 two-pass assembler.

Assembles one or more DataCode1 source files into a PHX (printable
hexadecimal) or OCB (object compressed binary) code image, together with a
plain-text listing and a reusable symbol map.

Example:

  dc1forge rom.map example.dc1

This generates example.phx, example.log and example.map.";

#[derive(Parser, Debug)]
#[command(
    name = "dc1forge",
    version = VERSION,
    about = "DataCode1 assembler producing PHX or OCB code images",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'b',
        long = "ocb",
        long_help = "Select OCB output format in lieu of PHX."
    )]
    pub ocb: bool,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PREFIX",
        long_help = "Filename prefix for all output files: the phx (or ocb) file, the \
                     log file and the map file. If not specified, the prefix is based on \
                     the first source filename ending with .dc1 if one exists, otherwise \
                     on the first source filename."
    )]
    pub output: Option<String>,
    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(short = 'L', long = "log-level", default_value_t = Level::INFO)]
    pub log_level: Level,
    /// DataCode1 source files, assembled in order
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,
}

/// The three per-run output files.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub target: PathBuf,
    pub listing: PathBuf,
    pub map: PathBuf,
}

/// Derive the shared output prefix: `-o` wins, then the first `.dc1`
/// source's stem, then the first source (with a trailing `.map` stripped,
/// since a previous run's map file is a legitimate first source).
pub fn output_prefix(cli: &Cli) -> String {
    if let Some(output) = &cli.output {
        return output.clone();
    }

    for source in &cli.sources {
        let name = source.to_string_lossy();
        if let Some(stem) = name.strip_suffix(".dc1") {
            return stem.to_string();
        }
    }

    let first = cli
        .sources
        .first()
        .map(|path| path.to_string_lossy().to_string())
        .unwrap_or_default();
    match first.strip_suffix(".map") {
        Some(stem) => stem.to_string(),
        None => first,
    }
}

pub fn resolve_output_paths(cli: &Cli) -> OutputPaths {
    let prefix = output_prefix(cli);
    let extension = if cli.ocb { "ocb" } else { "phx" };
    OutputPaths {
        target: PathBuf::from(format!("{prefix}.{extension}")),
        listing: PathBuf::from(format!("{prefix}.log")),
        map: PathBuf::from(format!("{prefix}.map")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags_and_sources() {
        let cli = Cli::parse_from(["dc1forge", "-b", "-o", "out", "rom.map", "prog.dc1"]);
        assert!(cli.ocb);
        assert_eq!(cli.output.as_deref(), Some("out"));
        assert_eq!(
            cli.sources,
            vec![PathBuf::from("rom.map"), PathBuf::from("prog.dc1")]
        );
        assert_eq!(cli.log_level, Level::INFO);
    }

    #[test]
    fn explicit_output_prefix_wins() {
        let cli = Cli::parse_from(["dc1forge", "-o", "build/out", "prog.dc1"]);
        assert_eq!(output_prefix(&cli), "build/out");
    }

    #[test]
    fn prefix_comes_from_first_dc1_source() {
        let cli = Cli::parse_from(["dc1forge", "rom.map", "prog.dc1"]);
        assert_eq!(output_prefix(&cli), "prog");
    }

    #[test]
    fn prefix_falls_back_to_first_source_without_map_suffix() {
        let cli = Cli::parse_from(["dc1forge", "rom.map", "other.src"]);
        assert_eq!(output_prefix(&cli), "rom");
        let cli = Cli::parse_from(["dc1forge", "plain.src"]);
        assert_eq!(output_prefix(&cli), "plain.src");
    }

    #[test]
    fn output_paths_follow_the_format_flag() {
        let cli = Cli::parse_from(["dc1forge", "prog.dc1"]);
        let paths = resolve_output_paths(&cli);
        assert_eq!(paths.target, PathBuf::from("prog.phx"));
        assert_eq!(paths.listing, PathBuf::from("prog.log"));
        assert_eq!(paths.map, PathBuf::from("prog.map"));

        let cli = Cli::parse_from(["dc1forge", "-b", "prog.dc1"]);
        assert_eq!(resolve_output_paths(&cli).target, PathBuf::from("prog.ocb"));
    }
}
