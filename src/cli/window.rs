use clap::Parser;

use crate::{
    cache::Partition,
    cli::query::{AreaArgs, SelectorArgs, report},
    core::{clock, error::PriceError},
    prelude::*,
    service,
    tables::build_window_table,
};

/// The provider is not called, so any token passes the validation.
const OFFLINE_CREDENTIAL: &str = "offline";

#[derive(Parser)]
pub struct WindowArgs {
    #[clap(flatten)]
    area: AreaArgs,

    #[clap(flatten)]
    selector: SelectorArgs,
}

impl WindowArgs {
    pub fn run(self) -> Result {
        let now = clock::now();
        let mut raw = self.area.to_raw(&self.selector, now.date_naive());
        raw.credential.get_or_insert_with(|| OFFLINE_CREDENTIAL.to_owned());
        let query = raw
            .validate(now.date_naive())
            .map_err(|errors| report(PriceError::from(errors), false))?;
        let window = service::resolve(&query, now).map_err(|error| report(error, false))?;
        let partition = Partition::of(&window, now.naive_local());
        info!(area = %query.area, %window, %partition, "resolved");
        println!("{}", build_window_table(&window, partition));
        Ok(())
    }
}
