//! Common logging initializer.
//!

use eyre::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use tracing_tree::HierarchicalLayer;

/// Initialise the global `tracing` subscriber.  Call once, early.
///
/// Filters come from the environment (`RUST_LOG`).  With `use_tree` we get
/// hierarchical span output, otherwise a compact single-line format.
///
pub fn init_logging(name: &'static str, use_tree: bool) -> Result<()> {
    // Load filters from environment
    //
    let filter = EnvFilter::from_default_env();

    // Do we want hierarchical output?
    //
    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_span_retrace(true)
                .with_span_modes(true)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    let compact = if use_tree {
        None
    } else {
        Some(fmt::layer().with_target(false).compact())
    };

    // Combine filter & specific format
    //
    tracing_subscriber::registry()
        .with(filter)
        .with(tree)
        .with(compact)
        .init();

    tracing::trace!("logging initialised for {}", name);
    Ok(())
}
