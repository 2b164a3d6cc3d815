use clap::Parser;
use reqwest::Url;

use crate::{
    api::entsoe,
    cli::query::{AreaArgs, SelectorArgs, report},
    core::clock,
    prelude::*,
    service::PriceService,
    tables::build_prices_table,
};

#[derive(Parser)]
pub struct PricesArgs {
    #[clap(flatten)]
    area: AreaArgs,

    #[clap(flatten)]
    selector: SelectorArgs,

    /// Print the price document as JSON instead of a table.
    #[clap(long)]
    json: bool,
}

impl PricesArgs {
    #[instrument(skip_all)]
    pub async fn run(self, api_url: Url) -> Result {
        let service = PriceService::builder().fetcher(entsoe::Api::new(api_url)?).build();
        let now = clock::now();
        let document = service
            .query(&self.area.to_raw(&self.selector, now.date_naive()), now)
            .await
            .map_err(|error| report(error, self.json))?;
        info!(
            area = %document.area,
            n_points = document.n_points(),
            mean_price = ?document.mean_price(),
            "fetched",
        );
        if self.json {
            println!("{}", serde_json::to_string_pretty(&document)?);
        } else {
            println!("{}", build_prices_table(&document));
        }
        Ok(())
    }
}
