//! SparkFly in a window.
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=sparkfly_engine=debug`) for level and
//! tick logs; warnings only by default. `SPARKFLY_SEED` fixes the level
//! sequence.

use sparkfly_engine::prelude::*;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let seed = match std::env::var("SPARKFLY_SEED") {
        Ok(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
            anyhow::anyhow!("SPARKFLY_SEED must be an unsigned integer: {e}")
        })?),
        Err(_) => None,
    };

    let game = TickLoop::new(TickConfig {
        seed,
        ..Default::default()
    })?;
    run_windowed(game)
}
