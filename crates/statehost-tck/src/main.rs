//! TCK host binary.
//!
//! Run with: `cargo run --package statehost-tck`

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("statehost=info".parse()?)
                .add_directive("statehost_tck=info".parse()?),
        )
        .init();

    let host = statehost_tck::build_tck_host()?.start()?;
    host.wait_for_shutdown().await;
    Ok(())
}
