//! Order lifecycle.
//!
//! Consolidated entry path for table, takeaway, and delivery orders: the
//! pricing computation is identical for every order type; only the metadata
//! (table number vs. customer vs. delivery address) differs. Placement is a
//! single transaction inserting the order header and its lines keyed by the
//! generated id. Orders are never physically deleted; cancellation is a
//! status transition.

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cart::{Cart, CartLine};
use crate::db::DbState;
use crate::error::PosError;
use crate::money::Money;
use crate::pricing::{self, PriceBreakdown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Table,
    Takeaway,
    Delivery,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Table => "Table",
            OrderType::Takeaway => "Takeaway",
            OrderType::Delivery => "Delivery",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Some(OrderType::Table),
            "takeaway" => Some(OrderType::Takeaway),
            "delivery" => Some(OrderType::Delivery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Per-type metadata. Discount and tendered are universally optional and
/// live on the breakdown instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderMeta {
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: i64,
    pub order_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub payment_status: String,
    pub breakdown: PriceBreakdown,
    pub meta: OrderMeta,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub menu_item_id: Option<i64>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub is_deal: bool,
}

/// Zero-padded display number for an order id, e.g. `CHC-003`.
pub fn order_number(id: i64) -> String {
    format!("CHC-{id:03}")
}

fn insert_lines(tx: &rusqlite::Transaction<'_>, order_id: i64, lines: &[CartLine]) -> Result<(), PosError> {
    for line in lines {
        tx.execute(
            "INSERT INTO order_items (order_id, menu_item_id, item_name, quantity, price_cents, is_deal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order_id,
                line.menu_item_id,
                line.name,
                line.quantity,
                line.unit_price.cents(),
                line.is_deal as i64
            ],
        )?;
    }
    Ok(())
}

/// Persist a new order: compute the breakdown, insert the header, then the
/// lines keyed by the generated id, all in one transaction. The caller
/// clears the cart only after this returns Ok.
pub fn place_order(
    db: &DbState,
    cart: &Cart,
    order_type: OrderType,
    discount_percent: f64,
    tendered: Option<Money>,
    note: Option<&str>,
    meta: &OrderMeta,
) -> Result<PlacedOrder, PosError> {
    if cart.is_empty() {
        return Err(PosError::InvalidInput("cannot place an empty order".into()));
    }
    let breakdown = pricing::compute_breakdown(cart.lines(), discount_percent, tendered)?;

    let mut conn = db.conn.lock()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO orders (order_type, status, payment_status, subtotal_cents, discount_percent,
                             discount_cents, total_cents, amount_received_cents, balance_return_cents,
                             table_number, customer_name, customer_phone, delivery_address, order_note)
         VALUES (?1, 'pending', 'pending', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            order_type.as_str(),
            breakdown.subtotal.cents(),
            breakdown.discount_percent,
            breakdown.discount_amount.cents(),
            breakdown.net_total.cents(),
            breakdown.tendered.map(Money::cents),
            breakdown.change_due.map(Money::cents),
            meta.table_number,
            meta.customer_name,
            meta.customer_phone,
            meta.delivery_address,
            note,
        ],
    )?;
    let id = tx.last_insert_rowid();
    insert_lines(&tx, id, cart.lines())?;
    tx.commit()?;

    let number = order_number(id);
    info!(
        order_id = id,
        order_number = %number,
        order_type = order_type.as_str(),
        total = %breakdown.net_total,
        "order placed"
    );
    Ok(PlacedOrder { id, order_number: number })
}

/// Replace an order's lines and totals (edit flow). The stored lines are
/// deleted and reinserted; the breakdown is recomputed from the new cart.
pub fn update_items(
    db: &DbState,
    order_id: i64,
    cart: &Cart,
    discount_percent: f64,
    tendered: Option<Money>,
) -> Result<(), PosError> {
    if cart.is_empty() {
        return Err(PosError::InvalidInput("cannot save an order with no items".into()));
    }
    let breakdown = pricing::compute_breakdown(cart.lines(), discount_percent, tendered)?;

    let mut conn = db.conn.lock()?;
    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE orders
         SET subtotal_cents = ?1, discount_percent = ?2, discount_cents = ?3, total_cents = ?4,
             amount_received_cents = ?5, balance_return_cents = ?6, updated_at = datetime('now')
         WHERE id = ?7",
        params![
            breakdown.subtotal.cents(),
            breakdown.discount_percent,
            breakdown.discount_amount.cents(),
            breakdown.net_total.cents(),
            breakdown.tendered.map(Money::cents),
            breakdown.change_due.map(Money::cents),
            order_id,
        ],
    )?;
    if changed == 0 {
        return Err(PosError::InvalidInput(format!("order {order_id} not found")));
    }
    tx.execute("DELETE FROM order_items WHERE order_id = ?1", params![order_id])?;
    insert_lines(&tx, order_id, cart.lines())?;
    tx.commit()?;

    info!(order_id, total = %breakdown.net_total, "order items replaced");
    Ok(())
}

/// Transition an order's status. Cancelling keeps the row.
pub fn update_status(db: &DbState, order_id: i64, status: OrderStatus) -> Result<(), PosError> {
    let conn = db.conn.lock()?;
    let changed = conn.execute(
        "UPDATE orders SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![status.as_str(), order_id],
    )?;
    if changed == 0 {
        return Err(PosError::InvalidInput(format!("order {order_id} not found")));
    }
    info!(order_id, status = status.as_str(), "order status updated");
    Ok(())
}

pub fn mark_paid(db: &DbState, order_id: i64) -> Result<(), PosError> {
    let conn = db.conn.lock()?;
    let changed = conn.execute(
        "UPDATE orders SET payment_status = 'paid', updated_at = datetime('now') WHERE id = ?1",
        params![order_id],
    )?;
    if changed == 0 {
        return Err(PosError::InvalidInput(format!("order {order_id} not found")));
    }
    Ok(())
}

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRecord> {
    let id: i64 = row.get(0)?;
    let type_str: String = row.get(1)?;
    let status_str: String = row.get(2)?;
    let subtotal = Money::from_cents(row.get(4)?);
    let discount_percent: f64 = row.get(5)?;
    let discount_amount = Money::from_cents(row.get(6)?);
    let net_total = Money::from_cents(row.get(7)?);
    let tendered: Option<Money> = row.get::<_, Option<i64>>(8)?.map(Money::from_cents);

    // Stored totals are the authoritative snapshot; only the change/shortfall
    // split is re-derived.
    let (change_due, shortfall) = match tendered {
        Some(amount) => (
            Some(amount.sub_or_zero(net_total)),
            Some(net_total.sub_or_zero(amount)),
        ),
        None => (None, None),
    };

    Ok(OrderRecord {
        id,
        order_number: order_number(id),
        order_type: OrderType::parse(&type_str).unwrap_or(OrderType::Takeaway),
        status: OrderStatus::parse(&status_str).unwrap_or(OrderStatus::Pending),
        payment_status: row.get(3)?,
        breakdown: PriceBreakdown {
            subtotal,
            discount_percent,
            discount_amount,
            net_total,
            tendered,
            change_due,
            shortfall,
        },
        meta: OrderMeta {
            table_number: row.get(9)?,
            customer_name: row.get(10)?,
            customer_phone: row.get(11)?,
            delivery_address: row.get(12)?,
        },
        note: row.get(13)?,
        created_at: row.get(14)?,
    })
}

const ORDER_COLUMNS: &str = "id, order_type, status, payment_status, subtotal_cents, \
     discount_percent, discount_cents, total_cents, amount_received_cents, \
     table_number, customer_name, customer_phone, delivery_address, order_note, created_at";

pub fn get_order(db: &DbState, order_id: i64) -> Result<OrderRecord, PosError> {
    let conn = db.conn.lock()?;
    conn.query_row(
        &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
        params![order_id],
        row_to_order,
    )
    .map_err(|err| match err {
        rusqlite::Error::QueryReturnedNoRows => {
            PosError::InvalidInput(format!("order {order_id} not found"))
        }
        other => other.into(),
    })
}

pub fn get_order_lines(db: &DbState, order_id: i64) -> Result<Vec<OrderLineRecord>, PosError> {
    let conn = db.conn.lock()?;
    let mut stmt = conn.prepare(
        "SELECT menu_item_id, item_name, quantity, price_cents, is_deal
         FROM order_items WHERE order_id = ?1 ORDER BY id",
    )?;
    let lines = stmt
        .query_map(params![order_id], |row| {
            Ok(OrderLineRecord {
                menu_item_id: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get::<_, i64>(2)?.max(0) as u32,
                unit_price: Money::from_cents(row.get(3)?),
                is_deal: row.get::<_, i64>(4)? != 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Orders newest-first, optionally filtered by type.
pub fn list_orders(db: &DbState, order_type: Option<OrderType>) -> Result<Vec<OrderRecord>, PosError> {
    let conn = db.conn.lock()?;
    let mut out = Vec::new();
    match order_type {
        Some(t) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE order_type = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![t.as_str()], row_to_order)?;
            for row in rows {
                out.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_order)?;
            for row in rows {
                out.push(row?);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::menu::MenuItem;
    use rusqlite::Connection;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn test_db() -> DbState {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma setup");
        db::run_migrations_for_test(&conn);
        DbState {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        }
    }

    // order_items.menu_item_id is a foreign key, so carts are built from
    // persisted menu rows.
    fn seed_item(db: &DbState, name: &str, price: i64) -> MenuItem {
        let id = crate::menu::add_item(db, name, "Mains", Money::from_major(price), false, &[])
            .unwrap();
        crate::menu::get_item(db, id).unwrap().unwrap()
    }

    fn cart_with_burgers(db: &DbState) -> Cart {
        let mut cart = Cart::new();
        let burger = seed_item(db, "Burger", 500);
        cart.add_or_increment(&burger);
        cart.add_or_increment(&burger);
        cart
    }

    #[test]
    fn test_order_number_zero_padded() {
        assert_eq!(order_number(3), "CHC-003");
        assert_eq!(order_number(42), "CHC-042");
        assert_eq!(order_number(1234), "CHC-1234");
    }

    #[test]
    fn test_place_order_persists_header_and_lines() {
        let db = test_db();
        let cart = cart_with_burgers(&db);
        let meta = OrderMeta {
            customer_name: Some("Ali".into()),
            ..OrderMeta::default()
        };
        let placed = place_order(
            &db,
            &cart,
            OrderType::Takeaway,
            10.0,
            Some(Money::from_major(1000)),
            Some("extra ketchup"),
            &meta,
        )
        .unwrap();
        assert_eq!(placed.order_number, order_number(placed.id));

        let order = get_order(&db, placed.id).unwrap();
        assert_eq!(order.order_type, OrderType::Takeaway);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.breakdown.subtotal, Money::from_major(1000));
        assert_eq!(order.breakdown.net_total, Money::from_major(900));
        assert_eq!(order.breakdown.change_due, Some(Money::from_major(100)));
        assert_eq!(order.meta.customer_name.as_deref(), Some("Ali"));
        assert_eq!(order.note.as_deref(), Some("extra ketchup"));

        let lines = get_order_lines(&db, placed.id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Burger");
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_place_empty_cart_rejected() {
        let db = test_db();
        let cart = Cart::new();
        let err = place_order(
            &db,
            &cart,
            OrderType::Table,
            0.0,
            None,
            None,
            &OrderMeta::default(),
        );
        assert!(matches!(err, Err(PosError::InvalidInput(_))));
        assert!(list_orders(&db, None).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_discount_places_nothing() {
        let db = test_db();
        let cart = cart_with_burgers(&db);
        let err = place_order(
            &db,
            &cart,
            OrderType::Table,
            150.0,
            None,
            None,
            &OrderMeta::default(),
        );
        assert!(matches!(err, Err(PosError::InvalidInput(_))));
        assert!(list_orders(&db, None).unwrap().is_empty());
    }

    #[test]
    fn test_update_items_replaces_lines_and_totals() {
        let db = test_db();
        let cart = cart_with_burgers(&db);
        let placed = place_order(
            &db,
            &cart,
            OrderType::Table,
            0.0,
            None,
            None,
            &OrderMeta { table_number: Some("4".into()), ..OrderMeta::default() },
        )
        .unwrap();

        let mut edited = Cart::new();
        edited.add_or_increment(&seed_item(&db, "Pizza", 800));
        update_items(&db, placed.id, &edited, 0.0, None).unwrap();

        let lines = get_order_lines(&db, placed.id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Pizza");
        let order = get_order(&db, placed.id).unwrap();
        assert_eq!(order.breakdown.net_total, Money::from_major(800));
    }

    #[test]
    fn test_cancel_keeps_the_row() {
        let db = test_db();
        let cart = cart_with_burgers(&db);
        let placed = place_order(
            &db,
            &cart,
            OrderType::Delivery,
            0.0,
            None,
            None,
            &OrderMeta { delivery_address: Some("12 Main St".into()), ..OrderMeta::default() },
        )
        .unwrap();

        update_status(&db, placed.id, OrderStatus::Cancelled).unwrap();
        let order = get_order(&db, placed.id).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(get_order_lines(&db, placed.id).unwrap().len(), 1);
    }

    #[test]
    fn test_list_orders_filters_by_type() {
        let db = test_db();
        let cart = cart_with_burgers(&db);
        place_order(&db, &cart, OrderType::Table, 0.0, None, None, &OrderMeta::default()).unwrap();
        place_order(&db, &cart, OrderType::Takeaway, 0.0, None, None, &OrderMeta::default()).unwrap();

        assert_eq!(list_orders(&db, None).unwrap().len(), 2);
        let takeaway = list_orders(&db, Some(OrderType::Takeaway)).unwrap();
        assert_eq!(takeaway.len(), 1);
        assert_eq!(takeaway[0].order_type, OrderType::Takeaway);
    }

    #[test]
    fn test_unknown_order_id_errors() {
        let db = test_db();
        assert!(matches!(
            update_status(&db, 999, OrderStatus::Completed),
            Err(PosError::InvalidInput(_))
        ));
        assert!(matches!(get_order(&db, 999), Err(PosError::InvalidInput(_))));
    }
}
