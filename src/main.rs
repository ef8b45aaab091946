extern crate log;

use anyhow::Result;
use clap::Parser;
use cli::Command;

mod app_type;
mod application;
mod argocd;
mod cli;
mod commands;
mod config;
mod context;
mod error;
mod output;
mod sources;
mod sync_policy;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::App::parse();
    let ctx = args.global_opts.context()?;

    match args.command {
        Command::Generate(args) => {
            commands::generate_application(&ctx, &args)?;
        }
        Command::Classify {} => {
            commands::classify_instance(&ctx)?;
        }
    }

    Ok(())
}
