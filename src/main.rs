mod amounts;
mod calendar;
mod catch_up;
mod cli;
mod item;
mod rule;
mod vault;

use crate::cli::recurring_operation;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    recurring_operation()
}
