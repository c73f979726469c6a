//! Receipt dispatch.
//!
//! Bridges persisted orders to the printer collaborator: load the order and
//! its lines, expand deal components, build the receipt document, render,
//! and hand the payload to the bridge. The bridge may come up after the UI
//! does, so dispatch polls for availability with a bounded number of
//! attempts before giving up with `Unavailable`. Printing is best-effort:
//! a failure is surfaced to the caller but the persisted order stands, so
//! "retry printing" never re-places the order.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::cart::CartLine;
use crate::db::{self, DbState};
use crate::deals;
use crate::error::PosError;
use crate::escpos::PaperWidth;
use crate::menu;
use crate::orders;
use crate::pricing::PriceBreakdown;
use crate::receipt_renderer::{
    self, LayoutConfig, OrderReceiptDoc, ReceiptComponentLine, ReceiptLine,
};

/// Printer collaborator exposed by the host shell. Thermal payloads are
/// opaque bytes; invoices are handed over as a full HTML document for the
/// host's print dialog.
pub trait ReceiptPrinter: Send + Sync {
    fn is_ready(&self) -> bool;
    fn print_receipt(&self, payload: &[u8]) -> Result<(), String>;
    fn present_invoice(&self, html: &str) -> Result<(), String>;
}

/// Availability poll: 50 ticks of 100ms, matching the old frontend's
/// five-second wait for the printer backend.
const PRINTER_WAIT_ATTEMPTS: u32 = 50;
const PRINTER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait for the printer bridge to report ready, bounded. Never blocks
/// indefinitely.
pub async fn wait_for_printer(printer: &dyn ReceiptPrinter) -> Result<(), PosError> {
    for attempt in 0..PRINTER_WAIT_ATTEMPTS {
        if printer.is_ready() {
            if attempt > 0 {
                info!(attempt, "printer became available");
            }
            return Ok(());
        }
        tokio::time::sleep(PRINTER_POLL_INTERVAL).await;
    }
    warn!("printer still not available after bounded wait");
    Err(PosError::Unavailable("printer"))
}

fn display_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn receipt_lines(db: &DbState, lines: &[orders::OrderLineRecord]) -> Result<Vec<ReceiptLine>, PosError> {
    let deal_ids: Vec<i64> = lines
        .iter()
        .filter(|l| l.is_deal)
        .filter_map(|l| l.menu_item_id)
        .collect();
    let components_map = menu::deal_components_map(db, &deal_ids)?;

    let cart_lines: Vec<CartLine> = lines
        .iter()
        .map(|l| CartLine {
            menu_item_id: l.menu_item_id.unwrap_or(0),
            name: l.name.clone(),
            unit_price: l.unit_price,
            quantity: l.quantity,
            is_deal: l.is_deal,
        })
        .collect();

    Ok(deals::expand_all(&cart_lines, &components_map)
        .into_iter()
        .map(|expanded| ReceiptLine {
            line_total: expanded.line.unit_price.times(expanded.line.quantity),
            name: expanded.line.name,
            quantity: expanded.line.quantity,
            unit_price: expanded.line.unit_price,
            components: expanded
                .components
                .into_iter()
                .map(|c| ReceiptComponentLine { name: c.name, quantity: c.quantity })
                .collect(),
        })
        .collect())
}

/// Build the printable document for a persisted order.
pub fn build_receipt_document(db: &DbState, order_id: i64) -> Result<OrderReceiptDoc, PosError> {
    let order = orders::get_order(db, order_id)?;
    let lines = orders::get_order_lines(db, order_id)?;
    let lines = receipt_lines(db, &lines)?;

    let breakdown: PriceBreakdown = order.breakdown;
    Ok(OrderReceiptDoc {
        order_number: order.order_number,
        order_type: order.order_type.as_str().to_string(),
        created_at: display_timestamp(&order.created_at),
        printed_at: Utc::now().format("%Y-%m-%d %H:%M").to_string(),
        table_number: order.meta.table_number,
        customer_name: order.meta.customer_name,
        customer_phone: order.meta.customer_phone,
        delivery_address: match order.order_type {
            orders::OrderType::Delivery => order.meta.delivery_address,
            _ => None,
        },
        note: order.note,
        lines,
        breakdown,
    })
}

/// Receipt layout from `local_settings`, falling back to built-in defaults.
pub fn layout_from_settings(db: &DbState) -> LayoutConfig {
    let defaults = LayoutConfig::default();
    let paper_width = db::get_setting(db, "receipt", "paper_width_mm")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .map(PaperWidth::from_mm)
        .unwrap_or(defaults.paper_width);
    LayoutConfig {
        paper_width,
        business_name: db::get_setting(db, "receipt", "business_name")
            .unwrap_or(defaults.business_name),
        address: db::get_setting(db, "receipt", "address").or(defaults.address),
        phone: db::get_setting(db, "receipt", "phone").or(defaults.phone),
        footer_text: db::get_setting(db, "receipt", "footer_text").or(defaults.footer_text),
        payment_note: db::get_setting(db, "receipt", "payment_note").or(defaults.payment_note),
    }
}

/// Print the thermal receipt for an order. Waits for the bridge (bounded),
/// then sends one opaque payload.
pub async fn print_order_receipt(
    db: &DbState,
    printer: &dyn ReceiptPrinter,
    order_id: i64,
) -> Result<(), PosError> {
    let doc = build_receipt_document(db, order_id)?;
    let cfg = layout_from_settings(db);
    let payload = receipt_renderer::render_escpos(&doc, &cfg);

    wait_for_printer(printer).await?;
    printer
        .print_receipt(&payload)
        .map_err(PosError::Print)?;
    info!(order_id, bytes = payload.len(), "receipt dispatched");
    Ok(())
}

/// Open the A4 invoice for an order in the host's print dialog.
pub async fn print_order_invoice(
    db: &DbState,
    printer: &dyn ReceiptPrinter,
    order_id: i64,
) -> Result<(), PosError> {
    let doc = build_receipt_document(db, order_id)?;
    let cfg = layout_from_settings(db);
    let html = receipt_renderer::render_html(&doc, &cfg);

    wait_for_printer(printer).await?;
    printer.present_invoice(&html).map_err(PosError::Print)?;
    info!(order_id, "invoice dispatched");
    Ok(())
}
