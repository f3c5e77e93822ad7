// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! backfill: schedule a plausible, backdated two-author commit history
//!
//! `backfill run` turns a plan of personas and content mutations into
//! working-hours commits; `backfill audit` flags commits that carry no real
//! change.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use backfill::commands;
use backfill::config::{Command, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs on stderr, summary on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .with_writer(std::io::stderr)
        .init();

    config.validate().context("invalid configuration")?;
    let repo = config.repo_path();

    match &config.command {
        Some(Command::Run(args)) => {
            let report = commands::run(&repo, args).context("run failed")?;
            info!(seed = report.seed, "run complete");
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report.summary)?);
            } else {
                print!("{}", report.summary);
                println!();
                print!("{}", commands::format_history(&report.history));
            }
        }
        Some(Command::Audit(args)) => {
            let audits = commands::audit(&repo, args).context("audit failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&audits)?);
            } else if audits.is_empty() {
                println!("No flagged commits");
            } else {
                print!("{}", commands::format_audit(&audits));
            }
        }
        None => {
            Config::command().print_help()?;
        }
    }
    Ok(())
}
