//! Raffle board service entry point.

use raffle_board::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
