use std::time::Duration;

use clap::crate_version;
use reqwest::Client;

use crate::prelude::*;

/// Build a client with the common settings and the specified timeout.
pub fn try_new(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("entsoe-prices/", crate_version!()))
        .timeout(timeout)
        .build()
        .context("failed to build the HTTP client")
}
