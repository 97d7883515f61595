//! DuckDB connection wrapper: schema bootstrap, query execution, transactions.
//!
//! One `Connection` is opened at startup and handed to everything that needs
//! storage. Rows come back as `serde_json::Value` maps so query modules can
//! deserialize them straight into model structs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use duckdb::{types::ValueRef, Connection as DuckDbConnection, ToSql};
use serde::de::DeserializeOwned;

use crate::error::Result;

const SCHEMA: &str = "
    CREATE SEQUENCE IF NOT EXISTS product_id_seq START 1;

    CREATE TABLE IF NOT EXISTS products (
        id              BIGINT PRIMARY KEY,
        url             VARCHAR NOT NULL UNIQUE,
        currency        VARCHAR NOT NULL,
        image           VARCHAR NOT NULL,
        title           VARCHAR NOT NULL,
        current_price   DOUBLE NOT NULL,
        original_price  DOUBLE NOT NULL,
        highest_price   DOUBLE NOT NULL,
        lowest_price    DOUBLE NOT NULL,
        average_price   DOUBLE NOT NULL,
        discount_rate   DOUBLE NOT NULL,
        description     VARCHAR NOT NULL,
        category        VARCHAR NOT NULL,
        reviews_count   BIGINT NOT NULL,
        stars           DOUBLE NOT NULL,
        is_out_of_stock BOOLEAN NOT NULL
    );

    CREATE TABLE IF NOT EXISTS price_history (
        product_id BIGINT NOT NULL,
        seq        BIGINT NOT NULL,
        price      DOUBLE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS subscribers (
        product_id BIGINT NOT NULL,
        email      VARCHAR NOT NULL
    );
";

/// Owns the DuckDB database that stores tracked products.
pub struct Connection {
    conn: DuckDbConnection,
}

impl Connection {
    /// Open (or create) a file-backed database and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = DuckDbConnection::open(path)?;
        log::debug!("Opened product database at {}", path.display());
        Self::with_schema(conn)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Self::with_schema(conn)
    }

    fn with_schema(conn: DuckDbConnection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        // Column metadata is only available once the statement has run.
        let column_names: Vec<String> = match rows.as_ref() {
            Some(stmt) => stmt.column_names().into_iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                map.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Run a statement that returns no rows. Returns the affected row count.
    pub fn execute_update(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("Rollback failed after {}: {}", e, rollback);
                }
                Err(e)
            }
        }
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => serde_json::Value::Number(i.into()),
            Err(_) => serde_json::Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        // The schema only uses the scalar types above.
        _ => serde_json::Value::Null,
    }
}
