//! Smart Promotions CLI

use std::process;

use jiff::Timestamp;
use tracing::{error, info};

use smartpromo_app::{
    config::{Cli, Commands},
    context::AppContext,
    observability,
};

#[tokio::main]
pub async fn main() {
    let cli = Cli::load().unwrap_or_else(|error| error.exit());

    let Commands::Run(config) = cli.command;

    if let Err(error) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for setup errors"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    let context = match AppContext::from_config(&config).await {
        Ok(context) => context,
        Err(error) => {
            error!(?error, "failed to initialise smart promotions");

            process::exit(1);
        }
    };

    let now = config.now.unwrap_or_else(Timestamp::now);

    info!(%now, business = ?config.business, "starting smart promotions run");

    let summary = context.job.run(now).await;

    match serde_json::to_string(&summary) {
        Ok(json) => {
            #[expect(
                clippy::print_stdout,
                reason = "the run summary is the command's output"
            )]
            {
                println!("{json}");
            }
        }
        Err(error) => {
            error!(%error, "failed to serialise run summary");

            process::exit(1);
        }
    }
}
