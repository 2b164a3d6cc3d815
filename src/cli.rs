mod prices;
mod query;
mod watch;
mod window;

use clap::{Parser, Subcommand};
use reqwest::Url;

use crate::{
    api::entsoe::DEFAULT_BASE_URL,
    cli::{prices::PricesArgs, watch::WatchArgs, window::WindowArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// ENTSO-E Transparency Platform API endpoint.
    #[clap(
        long = "entsoe-api-url",
        env = "ENTSOE_API_URL",
        default_value = DEFAULT_BASE_URL,
        global = true,
    )]
    pub entsoe_api_url: Url,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the day-ahead prices for the selected period.
    #[clap(name = "prices")]
    Prices(Box<PricesArgs>),

    /// Validate the selector and print the resolved query window, without calling the provider.
    #[clap(name = "window")]
    Window(Box<WindowArgs>),

    /// Keep polling the day-ahead prices with the cache and scheduled eviction active.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),
}

impl Args {
    pub async fn run(self) -> Result {
        match self.command {
            Command::Prices(args) => args.run(self.entsoe_api_url).await,
            Command::Window(args) => args.run(),
            Command::Watch(args) => args.run(self.entsoe_api_url).await,
        }
    }
}
