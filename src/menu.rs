//! Menu editor layer.
//!
//! CRUD for `menu_items` and their `deal_items` component templates. A deal
//! is a single priced menu item whose receipt display expands into named
//! component quantities; components carry no price of their own. Component
//! lists are replaced wholesale on every save, preserving insertion order
//! (insertion order = display order).

use std::collections::HashMap;

use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::DbState;
use crate::deals::DealComponent;
use crate::error::PosError;
use crate::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub unit_price: Money,
    pub is_available: bool,
    pub is_deal: bool,
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        unit_price: Money::from_cents(row.get(3)?),
        is_available: row.get::<_, i64>(4)? != 0,
        is_deal: row.get::<_, i64>(5)? != 0,
    })
}

fn validate_item(name: &str, unit_price: Money, is_deal: bool, components: &[DealComponent]) -> Result<(), PosError> {
    if name.trim().is_empty() {
        return Err(PosError::InvalidInput("menu item name is empty".into()));
    }
    if unit_price.is_negative() {
        return Err(PosError::InvalidInput(format!(
            "menu item price must not be negative (got {unit_price})"
        )));
    }
    if is_deal && components.is_empty() {
        return Err(PosError::InvalidInput(
            "a deal needs at least one component".into(),
        ));
    }
    if !is_deal && !components.is_empty() {
        return Err(PosError::InvalidInput(
            "components are only valid on deal items".into(),
        ));
    }
    for component in components {
        if component.name.trim().is_empty() {
            return Err(PosError::InvalidInput("deal component name is empty".into()));
        }
        if component.quantity == 0 {
            return Err(PosError::InvalidInput(
                "deal component quantity must be at least 1".into(),
            ));
        }
    }
    Ok(())
}

fn replace_components(tx: &Transaction<'_>, deal_id: i64, components: &[DealComponent]) -> Result<(), PosError> {
    tx.execute("DELETE FROM deal_items WHERE deal_id = ?1", params![deal_id])?;
    for component in components {
        tx.execute(
            "INSERT INTO deal_items (deal_id, item_name, quantity) VALUES (?1, ?2, ?3)",
            params![deal_id, component.name.trim(), component.quantity],
        )?;
    }
    Ok(())
}

/// All menu items, grouped the way the menu page lists them.
pub fn list_items(db: &DbState) -> Result<Vec<MenuItem>, PosError> {
    let conn = db.conn.lock()?;
    let mut stmt = conn.prepare(
        "SELECT id, name, category, price_cents, is_available, is_deal
         FROM menu_items ORDER BY category, name",
    )?;
    let items = stmt
        .query_map([], row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_item(db: &DbState, id: i64) -> Result<Option<MenuItem>, PosError> {
    let conn = db.conn.lock()?;
    let item = conn
        .query_row(
            "SELECT id, name, category, price_cents, is_available, is_deal
             FROM menu_items WHERE id = ?1",
            params![id],
            row_to_item,
        )
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(item)
}

/// Insert a menu item. For deals, `components` is the ordered template list.
pub fn add_item(
    db: &DbState,
    name: &str,
    category: &str,
    unit_price: Money,
    is_deal: bool,
    components: &[DealComponent],
) -> Result<i64, PosError> {
    validate_item(name, unit_price, is_deal, components)?;

    let mut conn = db.conn.lock()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO menu_items (name, category, price_cents, is_available, is_deal)
         VALUES (?1, ?2, ?3, 1, ?4)",
        params![name.trim(), category.trim(), unit_price.cents(), is_deal as i64],
    )?;
    let id = tx.last_insert_rowid();
    if is_deal {
        replace_components(&tx, id, components)?;
    }
    tx.commit()?;

    info!(id, name = name.trim(), is_deal, "menu item added");
    Ok(id)
}

/// Update a menu item, replacing its component list wholesale.
pub fn update_item(
    db: &DbState,
    id: i64,
    name: &str,
    category: &str,
    unit_price: Money,
    is_deal: bool,
    components: &[DealComponent],
) -> Result<(), PosError> {
    validate_item(name, unit_price, is_deal, components)?;

    let mut conn = db.conn.lock()?;
    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE menu_items
         SET name = ?1, category = ?2, price_cents = ?3, is_deal = ?4,
             updated_at = datetime('now')
         WHERE id = ?5",
        params![name.trim(), category.trim(), unit_price.cents(), is_deal as i64, id],
    )?;
    if changed == 0 {
        return Err(PosError::InvalidInput(format!("menu item {id} not found")));
    }
    replace_components(&tx, id, components)?;
    tx.commit()?;

    info!(id, name = name.trim(), "menu item updated");
    Ok(())
}

pub fn set_availability(db: &DbState, id: i64, available: bool) -> Result<(), PosError> {
    let conn = db.conn.lock()?;
    let changed = conn.execute(
        "UPDATE menu_items SET is_available = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![available as i64, id],
    )?;
    if changed == 0 {
        return Err(PosError::InvalidInput(format!("menu item {id} not found")));
    }
    debug!(id, available, "menu item availability changed");
    Ok(())
}

/// Delete a menu item; `deal_items` rows go with it via ON DELETE CASCADE.
pub fn delete_item(db: &DbState, id: i64) -> Result<(), PosError> {
    let conn = db.conn.lock()?;
    let changed = conn.execute("DELETE FROM menu_items WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(PosError::InvalidInput(format!("menu item {id} not found")));
    }
    info!(id, "menu item deleted");
    Ok(())
}

fn components_for(conn: &Connection, deal_id: i64) -> Result<Vec<DealComponent>, PosError> {
    let mut stmt = conn.prepare(
        "SELECT item_name, quantity FROM deal_items WHERE deal_id = ?1 ORDER BY id",
    )?;
    let components = stmt
        .query_map(params![deal_id], |row| {
            Ok(DealComponent {
                name: row.get(0)?,
                quantity: row.get::<_, i64>(1)?.max(1) as u32,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(components)
}

/// Ordered component template list for one deal. Empty for non-deals and for
/// deals saved without components.
pub fn deal_components(db: &DbState, deal_id: i64) -> Result<Vec<DealComponent>, PosError> {
    let conn = db.conn.lock()?;
    components_for(&conn, deal_id)
}

/// Component templates for a set of menu items, keyed by item id. Items
/// without components are simply absent from the map.
pub fn deal_components_map(
    db: &DbState,
    item_ids: &[i64],
) -> Result<HashMap<i64, Vec<DealComponent>>, PosError> {
    let conn = db.conn.lock()?;
    let mut map = HashMap::new();
    for &id in item_ids {
        let components = components_for(&conn, id)?;
        if !components.is_empty() {
            map.insert(id, components);
        }
    }
    Ok(map)
}
