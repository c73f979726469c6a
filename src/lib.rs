//! CraveHub POS core.
//!
//! Order pricing, cart state, deal expansion, receipt rendering, and local
//! SQLite persistence for a small cafe point of sale. The UI shell and its
//! IPC transport are collaborators, not part of this crate: persistence is
//! reached through [`db::DbState`] and the thermal printer through the
//! [`print::ReceiptPrinter`] trait.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod cart;
pub mod db;
pub mod deals;
pub mod error;
pub mod escpos;
pub mod menu;
pub mod money;
pub mod orders;
pub mod pricing;
pub mod print;
pub mod receipt_renderer;

pub use cart::{Cart, CartLine};
pub use deals::DealComponent;
pub use error::PosError;
pub use money::Money;
pub use orders::{OrderMeta, OrderStatus, OrderType};
pub use pricing::{compute_breakdown, PriceBreakdown};
pub use print::ReceiptPrinter;

/// Initialize structured logging (console + daily-rolling file).
///
/// Call once at startup from the host shell. Honors `RUST_LOG`.
pub fn init_logging(log_dir: &Path) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cravehub_pos=debug"));

    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "pos");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // The guard must outlive the process; dropping it stops the background
    // log writer.
    std::mem::forget(guard);

    info!("CraveHub POS core v{}", env!("CARGO_PKG_VERSION"));
}
