//! Binary entrypoint. All wiring lives in `interface::cli`.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    bookmark_sampler::interface::cli::run().await
}
