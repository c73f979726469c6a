//! Receipt rendering.
//!
//! Two pure output modes over the same order document: a fixed-column
//! thermal layout (ESC/POS bytes) and an A4 HTML invoice. The thermal item
//! table pads every column to a constant width so output aligns in a
//! monospace font regardless of item name length; names past the column
//! width are truncated with an ellipsis. Deal lines are followed by indented
//! component sub-lines at receipt-effective quantities. Rendering never
//! fails on valid input; an order with zero lines gets an empty item table.

use serde::{Deserialize, Serialize};

use crate::escpos::{EscPosBuilder, PaperWidth};
use crate::money::Money;
use crate::pricing::PriceBreakdown;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptComponentLine {
    pub name: String,
    /// Effective receipt quantity (template quantity x line quantity).
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    #[serde(default)]
    pub components: Vec<ReceiptComponentLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceiptDoc {
    pub order_number: String,
    pub order_type: String,
    pub created_at: String,
    pub printed_at: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub breakdown: PriceBreakdown,
}

/// Static business header/footer plus paper geometry.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub paper_width: PaperWidth,
    pub business_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub footer_text: Option<String>,
    /// Bank/payment details block under the footer, if configured.
    pub payment_note: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper_width: PaperWidth::Mm80,
            business_name: "CRAVEHUB CAFE".to_string(),
            address: None,
            phone: None,
            footer_text: Some("Thank you for your order!".to_string()),
            payment_note: None,
        }
    }
}

fn rs(value: Money) -> String {
    format!("Rs. {value}")
}

fn pct(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn opt(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut line = String::new();
    for token in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(token);
            continue;
        }
        let next_len = line.chars().count() + 1 + token.chars().count();
        if next_len > width.max(8) {
            out.push(line);
            line = token.to_string();
        } else {
            line.push(' ');
            line.push_str(token);
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

// ---------------------------------------------------------------------------
// Thermal item table
// ---------------------------------------------------------------------------

/// Fixed column widths for the item table. Columns sum to the paper width so
/// qty/price/amount start at the same character offset on every row.
#[derive(Debug, Clone, Copy)]
struct ItemColumns {
    sr: usize,
    name: usize,
    qty: usize,
    price: usize,
    total: usize,
}

fn item_columns(width: usize) -> ItemColumns {
    if width <= 32 {
        ItemColumns { sr: 3, name: 11, qty: 3, price: 7, total: 8 }
    } else {
        ItemColumns { sr: 3, name: 22, qty: 4, price: 9, total: 10 }
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = text.to_string();
    for _ in len..width {
        out.push(' ');
    }
    out
}

fn pad_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let mut out = String::new();
    for _ in len..width {
        out.push(' ');
    }
    out.push_str(text);
    out
}

fn truncate_name(name: &str, width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= width {
        return name.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = chars[..keep].iter().collect();
    out.push_str("...");
    out
}

fn item_row(cols: ItemColumns, sr: &str, name: &str, qty: &str, price: &str, total: &str) -> String {
    let mut row = String::new();
    row.push_str(&pad_right(sr, cols.sr));
    row.push_str(&pad_right(&truncate_name(name, cols.name), cols.name));
    row.push_str(&pad_left(qty, cols.qty));
    row.push_str(&pad_left(price, cols.price));
    row.push_str(&pad_left(total, cols.total));
    row
}

fn emit_item_table(builder: &mut EscPosBuilder, doc: &OrderReceiptDoc, width: usize) {
    let cols = item_columns(width);
    builder.separator();
    builder.bold(true);
    builder
        .text(&item_row(cols, "#", "Item", "Qty", "Price", "Amount"))
        .lf();
    builder.bold(false);
    builder.separator();

    for (index, line) in doc.lines.iter().enumerate() {
        builder
            .text(&item_row(
                cols,
                &format!("{}", index + 1),
                &line.name,
                &line.quantity.to_string(),
                &line.unit_price.to_string(),
                &line.line_total.to_string(),
            ))
            .lf();
        for component in &line.components {
            builder
                .text(&format!("   {} x {}", component.name, component.quantity))
                .lf();
        }
    }
}

fn emit_summary(builder: &mut EscPosBuilder, doc: &OrderReceiptDoc) {
    let breakdown = &doc.breakdown;
    let pieces: u32 = doc.lines.iter().map(|l| l.quantity).sum();

    builder.separator();
    builder.line_pair("Pieces", &pieces.to_string());
    builder.line_pair("Gross", &rs(breakdown.subtotal));
    if breakdown.discount_percent > 0.0 {
        builder.line_pair(
            &format!("Discount ({}%)", pct(breakdown.discount_percent)),
            &format!("-{}", rs(breakdown.discount_amount)),
        );
    }
    builder.bold(true);
    builder.line_pair("NET TOTAL", &rs(breakdown.net_total));
    builder.bold(false);

    match breakdown.tendered {
        Some(tendered) => {
            builder.line_pair("Given", &rs(tendered));
            let shortfall = breakdown.shortfall.unwrap_or(Money::ZERO);
            if shortfall > Money::ZERO {
                builder.line_pair("Short", &rs(shortfall));
            } else {
                builder.line_pair(
                    "Return",
                    &rs(breakdown.change_due.unwrap_or(Money::ZERO)),
                );
            }
        }
        None => {
            builder.line_pair("Paid", &rs(Money::ZERO));
            builder.line_pair("Balance", &rs(breakdown.net_total));
        }
    }
}

/// Render the thermal (fixed-width, ESC/POS) receipt.
pub fn render_escpos(doc: &OrderReceiptDoc, cfg: &LayoutConfig) -> Vec<u8> {
    let width = cfg.paper_width.chars();
    let mut builder = EscPosBuilder::new().with_paper(cfg.paper_width);
    builder.init().code_page(0);

    // Header block
    builder.center().bold(true).text(&cfg.business_name).lf().bold(false);
    if let Some(address) = cfg.address.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        for line in wrap(address, width) {
            builder.text(&line).lf();
        }
    }
    if let Some(phone) = cfg.phone.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        builder.text(phone).lf();
    }
    builder.left().separator();

    // Metadata block
    builder.line_pair("Order", &format!("#{}", doc.order_number));
    builder.line_pair("Type", &doc.order_type);
    builder.line_pair("Date", &doc.created_at);
    builder.line_pair("Printed", &doc.printed_at);
    if let Some(table) = opt(&doc.table_number) {
        builder.line_pair("Table", table);
    }
    if let Some(customer) = opt(&doc.customer_name) {
        builder.line_pair("Customer", customer);
    }
    if let Some(phone) = opt(&doc.customer_phone) {
        builder.line_pair("Phone", phone);
    }
    if let Some(address) = opt(&doc.delivery_address) {
        for line in wrap(&format!("Deliver to: {address}"), width) {
            builder.text(&line).lf();
        }
    }
    if let Some(note) = opt(&doc.note) {
        for line in wrap(&format!("Note: {note}"), width) {
            builder.text(&line).lf();
        }
    }

    emit_item_table(&mut builder, doc, width);
    emit_summary(&mut builder, doc);

    // Footer block
    builder.separator().center();
    if let Some(footer) = cfg.footer_text.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        for line in wrap(footer, width) {
            builder.text(&line).lf();
        }
    }
    if let Some(payment) = cfg.payment_note.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        for line in wrap(payment, width) {
            builder.text(&line).lf();
        }
    }
    builder.left().feed(4).cut();

    builder.build()
}

// ---------------------------------------------------------------------------
// A4 HTML invoice
// ---------------------------------------------------------------------------

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
body {{ font-family: Arial, sans-serif; padding: 20px; max-width: 520px; margin: 0 auto; color: #111; }}
.header {{ text-align: center; border-bottom: 2px solid #000; padding-bottom: 10px; margin-bottom: 20px; }}
.header h1 {{ margin: 0; font-size: 24px; }}
.header h2 {{ margin: 5px 0; font-size: 18px; color: #666; }}
.info p {{ margin: 4px 0; }}
.item-row {{ display: flex; justify-content: space-between; padding: 5px 0; border-bottom: 1px dotted #ccc; }}
.item-row.head {{ font-weight: bold; border-bottom: 2px solid #000; }}
.item-name {{ flex: 2; }}
.item-qty {{ flex: 1; text-align: center; }}
.item-price {{ flex: 1; text-align: right; }}
.totals {{ margin-top: 20px; padding-top: 10px; border-top: 2px solid #000; text-align: right; }}
.totals .net {{ font-size: 18px; font-weight: bold; }}
.footer {{ margin-top: 30px; text-align: center; font-size: 12px; color: #666; }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

/// Render the A4 invoice document. No deal expansion here; column alignment
/// is CSS-driven rather than fixed-width text.
pub fn render_html(doc: &OrderReceiptDoc, cfg: &LayoutConfig) -> String {
    let mut body = format!(
        "<div class=\"header\"><h1>{}</h1><h2>Invoice</h2></div>",
        esc(&cfg.business_name)
    );

    body.push_str("<div class=\"info\">");
    body.push_str(&format!(
        "<p><strong>Invoice #:</strong> {}</p><p><strong>Order Type:</strong> {}</p>",
        esc(&doc.order_number),
        esc(&doc.order_type)
    ));
    if let Some(table) = opt(&doc.table_number) {
        body.push_str(&format!("<p><strong>Table:</strong> {}</p>", esc(table)));
    }
    if let Some(customer) = opt(&doc.customer_name) {
        body.push_str(&format!("<p><strong>Customer:</strong> {}</p>", esc(customer)));
    }
    if let Some(phone) = opt(&doc.customer_phone) {
        body.push_str(&format!("<p><strong>Phone:</strong> {}</p>", esc(phone)));
    }
    if let Some(address) = opt(&doc.delivery_address) {
        body.push_str(&format!("<p><strong>Address:</strong> {}</p>", esc(address)));
    }
    body.push_str(&format!(
        "<p><strong>Order Date:</strong> {}</p></div>",
        esc(&doc.created_at)
    ));

    body.push_str(
        "<div class=\"items\"><div class=\"item-row head\">\
         <div class=\"item-name\">Item</div>\
         <div class=\"item-qty\">Qty</div>\
         <div class=\"item-price\">Price</div></div>",
    );
    for line in &doc.lines {
        body.push_str(&format!(
            "<div class=\"item-row\"><div class=\"item-name\">{}</div>\
             <div class=\"item-qty\">{}</div>\
             <div class=\"item-price\">{}</div></div>",
            esc(&line.name),
            line.quantity,
            rs(line.line_total)
        ));
    }
    body.push_str("</div>");

    let breakdown = &doc.breakdown;
    body.push_str("<div class=\"totals\">");
    body.push_str(&format!("<p>Gross: {}</p>", rs(breakdown.subtotal)));
    if breakdown.discount_percent > 0.0 {
        body.push_str(&format!(
            "<p>Discount ({}%): -{}</p>",
            pct(breakdown.discount_percent),
            rs(breakdown.discount_amount)
        ));
    }
    body.push_str(&format!(
        "<p class=\"net\">Total: {}</p></div>",
        rs(breakdown.net_total)
    ));

    body.push_str(&format!(
        "<div class=\"footer\"><p>{}</p><p>Generated on {}</p></div>",
        esc(cfg.footer_text.as_deref().unwrap_or("Thank you for your business!")),
        esc(&doc.printed_at)
    ));

    html_shell(&format!("Invoice #{}", doc.order_number), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing;
    use crate::cart::CartLine;

    fn breakdown(discount: f64, tendered: Option<Money>) -> PriceBreakdown {
        let lines = vec![CartLine {
            menu_item_id: 1,
            name: "Burger".into(),
            unit_price: Money::from_major(500),
            quantity: 2,
            is_deal: false,
        }];
        pricing::compute_breakdown(&lines, discount, tendered).unwrap()
    }

    fn doc(lines: Vec<ReceiptLine>, b: PriceBreakdown) -> OrderReceiptDoc {
        OrderReceiptDoc {
            order_number: "CHC-003".into(),
            order_type: "Takeaway".into(),
            created_at: "2026-08-29 12:30".into(),
            printed_at: "2026-08-29 12:31".into(),
            table_number: None,
            customer_name: Some("Ali".into()),
            customer_phone: None,
            delivery_address: None,
            note: None,
            lines,
            breakdown: b,
        }
    }

    fn receipt_line(name: &str, quantity: u32, price_major: i64) -> ReceiptLine {
        ReceiptLine {
            name: name.into(),
            quantity,
            unit_price: Money::from_major(price_major),
            line_total: Money::from_major(price_major * i64::from(quantity)),
            components: vec![],
        }
    }

    /// Plain-text lines of the rendered payload, control bytes stripped.
    fn text_lines(bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut skip = 0usize;
        for (i, &b) in bytes.iter().enumerate() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            match b {
                0x1B | 0x1D => {
                    // Command byte + parameters; all commands used here are
                    // 2 or 3 bytes long.
                    let next = bytes.get(i + 1).copied().unwrap_or(0);
                    skip = match (b, next) {
                        (0x1B, 0x40) => 1,
                        (0x1D, 0x56) => 3,
                        _ => 2,
                    };
                }
                0x0A => {
                    lines.push(current.clone());
                    current.clear();
                }
                other => current.push(other as char),
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    #[test]
    fn test_item_columns_align_regardless_of_name_length() {
        let b = breakdown(0.0, None);
        let lines = vec![
            receipt_line("Tea", 1, 50),
            receipt_line("Chicken Tikka Special Family Platter", 2, 950),
            receipt_line("Burger", 10, 500),
        ];
        let bytes = render_escpos(&doc(lines, b), &LayoutConfig::default());
        let rendered = text_lines(&bytes);

        let cols = item_columns(48);
        let qty_start = cols.sr + cols.name;
        let price_start = qty_start + cols.qty;
        let total_start = price_start + cols.price;

        let item_rows: Vec<&String> = rendered
            .iter()
            .filter(|l| {
                l.starts_with("1")
                    || l.starts_with("2")
                    || l.starts_with("3")
                    || l.starts_with("#")
            })
            .collect();
        assert_eq!(item_rows.len(), 4);
        for row in item_rows {
            assert_eq!(row.chars().count(), 48);
            let chars: Vec<char> = row.chars().collect();
            // Right-aligned columns end exactly at their boundary.
            assert_ne!(chars[price_start - 1], ' ', "qty column misaligned: {row:?}");
            assert_ne!(chars[total_start - 1], ' ', "price column misaligned: {row:?}");
            assert_ne!(chars[47], ' ', "amount column misaligned: {row:?}");
        }
    }

    #[test]
    fn test_long_name_truncated_with_ellipsis() {
        let b = breakdown(0.0, None);
        let lines = vec![receipt_line("Chicken Tikka Special Family Platter", 1, 950)];
        let bytes = render_escpos(&doc(lines, b), &LayoutConfig::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Chicken Tikka Speci..."));
        assert!(!text.contains("Platter"));
    }

    #[test]
    fn test_deal_components_rendered_as_sub_lines() {
        let b = breakdown(0.0, None);
        let lines = vec![ReceiptLine {
            name: "Family Pack".into(),
            quantity: 1,
            unit_price: Money::from_major(1500),
            line_total: Money::from_major(1500),
            components: vec![
                ReceiptComponentLine { name: "Pizza".into(), quantity: 1 },
                ReceiptComponentLine { name: "Drink".into(), quantity: 2 },
            ],
        }];
        let bytes = render_escpos(&doc(lines, b), &LayoutConfig::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("   Pizza x 1"));
        assert!(text.contains("   Drink x 2"));
    }

    #[test]
    fn test_summary_without_tendered_shows_paid_and_balance() {
        let b = breakdown(10.0, None);
        let bytes = render_escpos(&doc(vec![receipt_line("Burger", 2, 500)], b), &LayoutConfig::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Gross"));
        assert!(text.contains("Rs. 1000.00"));
        assert!(text.contains("Discount (10%)"));
        assert!(text.contains("-Rs. 100.00"));
        assert!(text.contains("NET TOTAL"));
        assert!(text.contains("Rs. 900.00"));
        assert!(text.contains("Paid"));
        assert!(text.contains("Balance"));
        assert!(!text.contains("Given"));
    }

    #[test]
    fn test_summary_with_tendered_shows_given_and_return() {
        let b = breakdown(10.0, Some(Money::from_major(1000)));
        let bytes = render_escpos(&doc(vec![receipt_line("Burger", 2, 500)], b), &LayoutConfig::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Given"));
        assert!(text.contains("Return"));
        assert!(!text.contains("Short"));
        assert!(!text.contains("Balance"));
    }

    #[test]
    fn test_summary_with_shortfall_shows_short_not_return() {
        let b = breakdown(0.0, Some(Money::from_major(700)));
        let bytes = render_escpos(&doc(vec![receipt_line("Burger", 2, 500)], b), &LayoutConfig::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Given"));
        assert!(text.contains("Short"));
        assert!(text.contains("Rs. 300.00"));
        assert!(!text.contains("Return"));
    }

    #[test]
    fn test_pieces_counts_top_level_lines_only() {
        let b = breakdown(0.0, None);
        let lines = vec![ReceiptLine {
            name: "Family Pack".into(),
            quantity: 2,
            unit_price: Money::from_major(1500),
            line_total: Money::from_major(3000),
            components: vec![ReceiptComponentLine { name: "Drink".into(), quantity: 4 }],
        }];
        let bytes = render_escpos(&doc(lines, b), &LayoutConfig::default());
        let rendered = text_lines(&bytes);
        let pieces_row = rendered.iter().find(|l| l.starts_with("Pieces")).unwrap();
        assert!(pieces_row.ends_with('2'));
    }

    #[test]
    fn test_empty_order_renders_without_items() {
        let b = pricing::compute_breakdown(&[], 0.0, None).unwrap();
        let bytes = render_escpos(&doc(vec![], b), &LayoutConfig::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("CRAVEHUB CAFE"));
        assert!(text.contains("NET TOTAL"));
        assert!(text.contains("Rs. 0.00"));
        // Table header present, no numbered rows.
        assert!(text.contains("Item"));
        assert!(!text.contains("1  "));
    }

    #[test]
    fn test_payload_ends_with_feed_and_cut() {
        let b = breakdown(0.0, None);
        let bytes = render_escpos(&doc(vec![], b), &LayoutConfig::default());
        let tail = &bytes[bytes.len() - 4..];
        assert_eq!(tail, &[0x1D, 0x56, 0x41, 0x10]);
    }

    #[test]
    fn test_html_invoice_contains_metadata_and_totals() {
        let b = breakdown(10.0, Some(Money::from_major(1000)));
        let html = render_html(
            &doc(vec![receipt_line("Burger", 2, 500)], b),
            &LayoutConfig::default(),
        );
        assert!(html.contains("Invoice #: CHC-003") || html.contains("Invoice #:</strong> CHC-003"));
        assert!(html.contains("Takeaway"));
        assert!(html.contains("Burger"));
        assert!(html.contains("Rs. 1000.00"));
        assert!(html.contains("Rs. 900.00"));
    }

    #[test]
    fn test_html_escapes_item_names() {
        let b = breakdown(0.0, None);
        let html = render_html(
            &doc(vec![receipt_line("Fish & Chips <Large>", 1, 600)], b),
            &LayoutConfig::default(),
        );
        assert!(html.contains("Fish &amp; Chips &lt;Large&gt;"));
        assert!(!html.contains("<Large>"));
    }
}
