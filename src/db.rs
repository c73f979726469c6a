//! Local SQLite database layer.
//!
//! rusqlite with WAL mode, versioned migrations guarded by a
//! `schema_version` table, and a settings helper backed by `local_settings`.
//! All access is parameterized; no query text is ever built from user input.
//! Monetary columns store integer cents.

use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::error::PosError;

/// Shared state holding the database connection.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Initialize the database at `{data_dir}/cravehub.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(data_dir: &Path) -> Result<DbState, PosError> {
    fs::create_dir_all(data_dir)
        .map_err(|e| PosError::Persistence(format!("create data dir: {e}")))?;

    let db_path = data_dir.join("cravehub.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!("Database open failed ({first_err}), deleting and retrying once");
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                let _ = fs::remove_file(db_path.with_extension("db-wal"));
                let _ = fs::remove_file(db_path.with_extension("db-shm"));
            }
            open_and_configure(&db_path)
                .map_err(|e| PosError::Persistence(format!("open after retry: {e}")))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, PosError> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), PosError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Migration v1: menu, deals, orders, order lines, settings.
fn migrate_v1(conn: &Connection) -> Result<(), PosError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS menu_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            price_cents INTEGER NOT NULL DEFAULT 0 CHECK (price_cents >= 0),
            is_available INTEGER NOT NULL DEFAULT 1,
            is_deal INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS deal_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deal_id INTEGER NOT NULL REFERENCES menu_items(id) ON DELETE CASCADE,
            item_name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 1)
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            payment_status TEXT NOT NULL DEFAULT 'pending',
            subtotal_cents INTEGER NOT NULL DEFAULT 0,
            discount_percent REAL NOT NULL DEFAULT 0,
            discount_cents INTEGER NOT NULL DEFAULT 0,
            total_cents INTEGER NOT NULL DEFAULT 0,
            amount_received_cents INTEGER,
            balance_return_cents INTEGER,
            table_number TEXT,
            customer_name TEXT,
            customer_phone TEXT,
            delivery_address TEXT,
            order_note TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            menu_item_id INTEGER REFERENCES menu_items(id) ON DELETE SET NULL,
            item_name TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
            is_deal INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS local_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            setting_category TEXT NOT NULL,
            setting_key TEXT NOT NULL,
            setting_value TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(setting_category, setting_key)
        );

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )?;
    Ok(())
}

/// Migration v2: query-path indexes.
fn migrate_v2(conn: &Connection) -> Result<(), PosError> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_orders_type ON orders(order_type);
        CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
        CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);
        CREATE INDEX IF NOT EXISTS idx_deal_items_deal ON deal_items(deal_id);
        CREATE INDEX IF NOT EXISTS idx_menu_items_category ON menu_items(category);

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )?;
    Ok(())
}

/// Run migrations on an arbitrary connection. Test helper for in-memory
/// databases.
pub fn run_migrations_for_test(conn: &Connection) {
    run_migrations(conn).expect("test migrations");
}

// ---------------------------------------------------------------------------
// Settings helpers
// ---------------------------------------------------------------------------

/// Read one local setting value, or `None` when unset.
pub fn get_setting(db: &DbState, category: &str, key: &str) -> Option<String> {
    let conn = db.conn.lock().ok()?;
    conn.query_row(
        "SELECT setting_value FROM local_settings
         WHERE setting_category = ?1 AND setting_key = ?2",
        params![category, key],
        |row| row.get(0),
    )
    .ok()
}

/// Upsert one local setting.
pub fn set_setting(db: &DbState, category: &str, key: &str, value: &str) -> Result<(), PosError> {
    let conn = db.conn.lock()?;
    conn.execute(
        "INSERT INTO local_settings (setting_category, setting_key, setting_value)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(setting_category, setting_key) DO UPDATE SET
            setting_value = excluded.setting_value,
            updated_at = datetime('now')",
        params![category, key, value],
    )?;
    Ok(())
}
