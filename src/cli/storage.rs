use clap::Parser;
use reqwest::Url;

use crate::{api::storage::Client, prelude::*};

#[derive(Parser)]
pub struct StorageArgs {
    /// Base URL of the metering backend.
    #[clap(long = "storage-url", env = "STORAGE_URL")]
    url: Url,

    #[clap(long = "storage-timeout", env = "STORAGE_TIMEOUT", default_value = "10s")]
    timeout: humantime::Duration,
}

impl StorageArgs {
    pub fn connect(&self) -> Result<Client> {
        Client::new(&self.url, self.timeout.into())
    }
}
