//! SQLite-backed store

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use super::TranscriptStore;
use super::types::*;
use crate::{Error, Result};

const CALL_COLUMNS: &str =
    "id, call_sid, caller_number, status, transcript, ai_response, duration, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, stock, active, created_at";
const FAQ_COLUMNS: &str = "id, question, answer, created_at";
const ORDER_COLUMNS: &str = "id, customer_phone, items, total, payment_intent_id, status, \
                             confirmation_number, created_at";

/// SQLite storage for calls, products, FAQs and orders
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!("Opening database at: {}", db_path);
        let store = Self {
            conn: Mutex::new(Connection::open(db_path)?),
        };
        store.init_tables()?;
        info!("SqliteStore initialized at {}", db_path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("database connection lock poisoned".to_string()))
    }

    fn init_tables(&self) -> Result<()> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS calls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                call_sid TEXT NOT NULL,
                caller_number TEXT NOT NULL,
                status TEXT NOT NULL,
                transcript TEXT,
                ai_response TEXT,
                duration INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_calls_call_sid ON calls(call_sid);

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                price REAL NOT NULL,
                category TEXT,
                stock INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS faqs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_phone TEXT NOT NULL,
                items TEXT NOT NULL,
                total REAL NOT NULL,
                payment_intent_id TEXT,
                status TEXT NOT NULL,
                confirmation_number TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    pub fn insert_call(&self, call_sid: &str, caller_number: &str) -> Result<CallRecord> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO calls (call_sid, caller_number, status, duration, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![call_sid, caller_number, CallStatus::Answered.as_str(), now()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Logged call {} from {} as row {}", call_sid, caller_number, id);

        conn.query_row(
            &format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = ?1"),
            params![id],
            call_from_row,
        )
        .map_err(Error::from)
    }

    pub fn update_transcript(
        &self,
        call_sid: &str,
        transcript: &str,
        ai_response: &str,
    ) -> Result<bool> {
        let rows = self.conn()?.execute(
            // Only the first speech turn of a call is kept.
            "UPDATE calls SET transcript = ?2, ai_response = ?3 \
             WHERE call_sid = ?1 AND transcript IS NULL",
            params![call_sid, transcript, ai_response],
        )?;
        Ok(rows > 0)
    }

    pub fn calls(&self) -> Result<Vec<CallRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CALL_COLUMNS} FROM calls ORDER BY created_at DESC, id DESC"
        ))?;
        let calls = stmt
            .query_map([], call_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(calls)
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub fn products(&self) -> Result<Vec<Product>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }

    pub fn insert_product(&self, input: ProductInput) -> Result<Product> {
        input.validate()?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO products (name, description, price, category, stock, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.name.trim(),
                input.description,
                input.price,
                input.category,
                input.stock.unwrap_or(0),
                input.active.unwrap_or(true),
                now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        load_product(&conn, id)?.ok_or_else(|| Error::not_found("product", id))
    }

    pub fn update_product(&self, id: i64, patch: ProductPatch) -> Result<Product> {
        patch.validate()?;

        let conn = self.conn()?;
        let mut product = load_product(&conn, id)?.ok_or_else(|| Error::not_found("product", id))?;
        patch.apply(&mut product);

        conn.execute(
            "UPDATE products
             SET name = ?2, description = ?3, price = ?4, category = ?5, stock = ?6, active = ?7
             WHERE id = ?1",
            params![
                id,
                product.name,
                product.description,
                product.price,
                product.category,
                product.stock,
                product.active,
            ],
        )?;
        Ok(product)
    }

    pub fn delete_product(&self, id: i64) -> Result<()> {
        let rows = self
            .conn()?
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::not_found("product", id));
        }
        debug!("Deleted product {}", id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // FAQs
    // ------------------------------------------------------------------

    pub fn faqs(&self) -> Result<Vec<Faq>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FAQ_COLUMNS} FROM faqs ORDER BY created_at DESC, id DESC"
        ))?;
        let faqs = stmt
            .query_map([], faq_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(faqs)
    }

    pub fn insert_faq(&self, input: FaqInput) -> Result<Faq> {
        input.validate()?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO faqs (question, answer, created_at) VALUES (?1, ?2, ?3)",
            params![input.question.trim(), input.answer.trim(), now()],
        )?;
        let id = conn.last_insert_rowid();
        load_faq(&conn, id)?.ok_or_else(|| Error::not_found("FAQ", id))
    }

    pub fn update_faq(&self, id: i64, patch: FaqPatch) -> Result<Faq> {
        patch.validate()?;

        let conn = self.conn()?;
        let mut faq = load_faq(&conn, id)?.ok_or_else(|| Error::not_found("FAQ", id))?;
        if let Some(question) = patch.question {
            faq.question = question.trim().to_string();
        }
        if let Some(answer) = patch.answer {
            faq.answer = answer.trim().to_string();
        }

        conn.execute(
            "UPDATE faqs SET question = ?2, answer = ?3 WHERE id = ?1",
            params![id, faq.question, faq.answer],
        )?;
        Ok(faq)
    }

    pub fn delete_faq(&self, id: i64) -> Result<()> {
        let rows = self
            .conn()?
            .execute("DELETE FROM faqs WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::not_found("FAQ", id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    pub fn orders(&self) -> Result<Vec<Order>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// Insert an order and assign its `ORD-<unix millis>` confirmation number
    pub fn insert_order(&self, new_order: NewOrder) -> Result<Order> {
        new_order.validate()?;

        let created_at = Utc::now();
        let confirmation_number = format!("ORD-{}", created_at.timestamp_millis());
        let items = serde_json::to_string(&new_order.items)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO orders
                (customer_phone, items, total, payment_intent_id, status, confirmation_number, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new_order.customer_phone,
                items,
                new_order.total,
                new_order.payment_intent_id,
                new_order.status.as_str(),
                confirmation_number,
                timestamp(&created_at),
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!("Stored order {} ({})", id, confirmation_number);

        load_order(&conn, id)?.ok_or_else(|| Error::not_found("order", id))
    }

    pub fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Order> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE orders SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::not_found("order", id));
        }
        load_order(&conn, id)?.ok_or_else(|| Error::not_found("order", id))
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub fn stats(&self) -> Result<Stats> {
        let conn = self.conn()?;

        let (total_calls, total_duration): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration), 0) FROM calls",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let (total_orders, total_revenue): (i64, f64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total), 0.0) FROM orders",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let avg_call_duration = if total_calls > 0 {
            (total_duration as f64 / total_calls as f64).round() as u64
        } else {
            0
        };

        Ok(Stats {
            total_calls: total_calls as u64,
            total_orders: total_orders as u64,
            total_revenue,
            avg_call_duration,
        })
    }
}

#[async_trait]
impl TranscriptStore for SqliteStore {
    async fn create_call(&self, call_sid: &str, caller_number: &str) -> Result<CallRecord> {
        self.insert_call(call_sid, caller_number)
    }

    async fn attach_transcript(
        &self,
        call_sid: &str,
        transcript: &str,
        ai_response: &str,
    ) -> Result<bool> {
        self.update_transcript(call_sid, transcript, ai_response)
    }

    async fn list_calls(&self) -> Result<Vec<CallRecord>> {
        self.calls()
    }
}

// ----------------------------------------------------------------------
// Row helpers
// ----------------------------------------------------------------------

fn now() -> String {
    timestamp(&Utc::now())
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn call_from_row(row: &Row<'_>) -> rusqlite::Result<CallRecord> {
    Ok(CallRecord {
        id: row.get(0)?,
        call_sid: row.get(1)?,
        caller_number: row.get(2)?,
        status: parsed_column(row, 3)?,
        transcript: row.get(4)?,
        ai_response: row.get(5)?,
        duration_seconds: row.get(6)?,
        created_at: parsed_column(row, 7)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        stock: row.get(5)?,
        active: row.get(6)?,
        created_at: parsed_column(row, 7)?,
    })
}

fn faq_from_row(row: &Row<'_>) -> rusqlite::Result<Faq> {
    Ok(Faq {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        created_at: parsed_column(row, 3)?,
    })
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let items_json: String = row.get(2)?;
    let items = serde_json::from_str(&items_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(Order {
        id: row.get(0)?,
        customer_phone: row.get(1)?,
        items,
        total: row.get(3)?,
        payment_intent_id: row.get(4)?,
        status: parsed_column(row, 5)?,
        confirmation_number: row.get(6)?,
        created_at: parsed_column(row, 7)?,
    })
}

fn load_product(conn: &Connection, id: i64) -> Result<Option<Product>> {
    Ok(conn
        .query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
            params![id],
            product_from_row,
        )
        .optional()?)
}

fn load_faq(conn: &Connection, id: i64) -> Result<Option<Faq>> {
    Ok(conn
        .query_row(
            &format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE id = ?1"),
            params![id],
            faq_from_row,
        )
        .optional()?)
}

fn load_order(conn: &Connection, id: i64) -> Result<Option<Order>> {
    Ok(conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            params![id],
            order_from_row,
        )
        .optional()?)
}
