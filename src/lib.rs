use async_trait::async_trait;
use clap::Command;

pub mod commands;
pub mod config;
pub mod cube2sphere;
pub mod discover;
pub mod error;
pub mod layout;
pub mod logger;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;

#[async_trait]
pub trait Subcommand {
    fn get_subcommand(&self) -> Command;
    async fn run(&self, matches: &clap::ArgMatches) -> anyhow::Result<()>;
}
