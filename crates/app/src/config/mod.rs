//! Command line and environment configuration.

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use uuid::Uuid;

use crate::{domain::businesses::records::BusinessUuid, job::EngineSettings};

pub mod db;
pub mod engine;
pub mod logging;
pub mod push;

use db::DatabaseConfig;
use engine::EngineConfig;
use logging::LoggingConfig;
use push::PushConfig;

/// Smart promotions command line.
#[derive(Debug, Parser)]
#[command(name = "smartpromo-app", about = "Smart promotional notifications", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the smart promotions job once.
    Run(RunConfig),
}

/// Settings of one job run.
#[derive(Debug, Args)]
pub struct RunConfig {
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub push: PushConfig,

    #[command(flatten)]
    pub engine: EngineConfig,

    /// Instant the run treats as now (RFC 3339); defaults to the wall clock
    #[arg(long)]
    pub now: Option<Timestamp>,

    /// Only process this business
    #[arg(long)]
    pub business: Option<Uuid>,
}

impl RunConfig {
    pub fn settings(&self) -> EngineSettings {
        self.engine.settings(self.business.map(BusinessUuid::from_uuid))
    }
}

impl Cli {
    /// Load configuration from `.env`, the environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
