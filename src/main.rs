// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for dc1forge.

use std::io;
use std::process;

use clap::Parser;

use dc1forge::assembler::{self, cli::Cli};
use dc1forge::report;

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();
    let use_color = report::use_color();

    match assembler::run(&cli) {
        Ok(run) => {
            for diag in &run.diagnostics {
                eprintln!("{}", diag.format(use_color));
            }
            println!("Listing file: {}", run.listing_path.display());

            if run.counts.errors > 0 {
                println!("Assembly failed");
                println!("Errors:   {}", run.counts.errors);
                println!("Warnings: {}", run.counts.warnings);
                process::exit(1);
            }

            if run.counts.warnings > 0 {
                println!("Assembly complete with {} warnings", run.counts.warnings);
            } else {
                println!("Assembly successful");
            }
            if let Some(path) = &run.output_path {
                println!("Output file: {}", path.display());
            }
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(2);
        }
    }
}
