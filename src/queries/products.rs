//! Product storage against the DuckDB `products`, `price_history` and
//! `subscribers` tables.

use serde::Deserialize;

use crate::connection::Connection;
use crate::error::{Result, TrackerError};
use crate::models::{PriceHistoryItem, Product, User};

const PRODUCT_COLUMNS: &str = "id, url, currency, image, title, current_price, original_price, \
     highest_price, lowest_price, average_price, discount_rate, description, category, \
     reviews_count, stars, is_out_of_stock";

// ---------------------------------------------------------------------------
// ProductRow: Scalar columns of the products table
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProductRow {
    id: i64,
    url: String,
    currency: String,
    image: String,
    title: String,
    current_price: f64,
    original_price: f64,
    highest_price: f64,
    lowest_price: f64,
    average_price: f64,
    discount_rate: f64,
    description: String,
    category: String,
    reviews_count: i64,
    stars: f64,
    is_out_of_stock: bool,
}

impl ProductRow {
    fn into_product(self, price_history: Vec<PriceHistoryItem>, users: Vec<User>) -> Product {
        Product {
            id: Some(self.id),
            url: self.url,
            currency: self.currency,
            image: self.image,
            title: self.title,
            current_price: self.current_price,
            original_price: self.original_price,
            price_history,
            highest_price: self.highest_price,
            lowest_price: self.lowest_price,
            average_price: self.average_price,
            discount_rate: self.discount_rate,
            description: self.description,
            category: self.category,
            reviews_count: self.reviews_count,
            stars: self.stars,
            is_out_of_stock: self.is_out_of_stock,
            users,
        }
    }
}

// ---------------------------------------------------------------------------
// ProductQuery
// ---------------------------------------------------------------------------

/// Storage interface for tracked products, keyed uniquely by URL.
pub struct ProductQuery<'a> {
    conn: &'a Connection,
}

impl<'a> ProductQuery<'a> {
    /// Create a new `ProductQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Look up a product by its URL.
    pub fn find_by_url(&self, url: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE url = ?", PRODUCT_COLUMNS);
        let rows: Vec<ProductRow> = self.conn.execute_into(&sql, &[&url])?;
        self.hydrate_first(rows)
    }

    /// Look up a product by its storage id. A missing id is `Ok(None)`.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
        let rows: Vec<ProductRow> = self.conn.execute_into(&sql, &[&id])?;
        self.hydrate_first(rows)
    }

    /// All tracked products, oldest first.
    pub fn list(&self) -> Result<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY id", PRODUCT_COLUMNS);
        let rows: Vec<ProductRow> = self.conn.execute_into(&sql, &[])?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// URLs of all tracked products, oldest first.
    pub fn urls(&self) -> Result<Vec<String>> {
        let rows = self.conn.execute("SELECT url FROM products ORDER BY id", &[])?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("url").and_then(|v| v.as_str()).map(str::to_string))
            .collect())
    }

    /// Number of tracked products.
    pub fn count(&self) -> Result<i64> {
        let count = self.conn.execute_scalar("SELECT COUNT(*) FROM products", &[])?;
        Ok(count.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Insert or replace the record stored under `product.url`.
    ///
    /// Runs in a single transaction. Scalar fields and the price history are
    /// replaced; subscribers are merged into the stored set, never removed.
    /// Returns the record as stored, with its id and full subscriber set.
    pub fn upsert(&self, product: &Product) -> Result<Product> {
        if product.url.trim().is_empty() {
            return Err(TrackerError::InvalidArgument(
                "Product URL must not be empty".into(),
            ));
        }
        validate_prices(product)?;

        let id = self.conn.transaction(|conn| {
            let existing = conn.execute_scalar(
                "SELECT id FROM products WHERE url = ?",
                &[&product.url],
            )?;

            let id = match existing.and_then(|v| v.as_i64()) {
                Some(id) => {
                    update_product(conn, id, product)?;
                    id
                }
                None => {
                    let id = conn
                        .execute_scalar("SELECT nextval('product_id_seq')", &[])?
                        .and_then(|v| v.as_i64())
                        .ok_or_else(|| {
                            TrackerError::NotFound("product_id_seq returned no value".into())
                        })?;
                    insert_product(conn, id, product)?;
                    id
                }
            };

            replace_history(conn, id, &product.price_history)?;
            merge_subscribers(conn, id, &product.users)?;
            Ok(id)
        })?;

        log::debug!(
            "Stored product {} ({} price points)",
            product.url,
            product.price_history.len()
        );

        self.find_by_id(id)?.ok_or_else(|| {
            TrackerError::NotFound(format!("Product {} vanished after upsert", id))
        })
    }

    fn hydrate_first(&self, rows: Vec<ProductRow>) -> Result<Option<Product>> {
        rows.into_iter().next().map(|row| self.hydrate(row)).transpose()
    }

    fn hydrate(&self, row: ProductRow) -> Result<Product> {
        let history: Vec<PriceHistoryItem> = self.conn.execute_into(
            "SELECT price FROM price_history WHERE product_id = ? ORDER BY seq",
            &[&row.id],
        )?;
        let users: Vec<User> = self.conn.execute_into(
            "SELECT email FROM subscribers WHERE product_id = ? ORDER BY rowid",
            &[&row.id],
        )?;
        Ok(row.into_product(history, users))
    }
}

// ---------------------------------------------------------------------------
// Write helpers (run inside the upsert transaction)
// ---------------------------------------------------------------------------

/// Prices must be finite and non-negative; the discount is a percentage.
fn validate_prices(p: &Product) -> Result<()> {
    let scalars = [
        ("current price", p.current_price),
        ("original price", p.original_price),
    ];
    let history = p
        .price_history
        .iter()
        .map(|item| ("price history entry", item.price));
    for (label, value) in scalars.into_iter().chain(history) {
        if !value.is_finite() || value < 0.0 {
            return Err(TrackerError::InvalidArgument(format!(
                "Invalid {} for {}: {}",
                label, p.url, value
            )));
        }
    }
    if !(0.0..=100.0).contains(&p.discount_rate) {
        return Err(TrackerError::InvalidArgument(format!(
            "Discount rate for {} must be within 0..=100, got {}",
            p.url, p.discount_rate
        )));
    }
    Ok(())
}

fn insert_product(conn: &Connection, id: i64, p: &Product) -> Result<()> {
    conn.execute_update(
        "INSERT INTO products (id, url, currency, image, title, current_price, original_price, \
         highest_price, lowest_price, average_price, discount_rate, description, category, \
         reviews_count, stars, is_out_of_stock) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        &[
            &id,
            &p.url,
            &p.currency,
            &p.image,
            &p.title,
            &p.current_price,
            &p.original_price,
            &p.highest_price,
            &p.lowest_price,
            &p.average_price,
            &p.discount_rate,
            &p.description,
            &p.category,
            &p.reviews_count,
            &p.stars,
            &p.is_out_of_stock,
        ],
    )?;
    Ok(())
}

fn update_product(conn: &Connection, id: i64, p: &Product) -> Result<()> {
    conn.execute_update(
        "UPDATE products SET currency = ?, image = ?, title = ?, current_price = ?, \
         original_price = ?, highest_price = ?, lowest_price = ?, average_price = ?, \
         discount_rate = ?, description = ?, category = ?, reviews_count = ?, stars = ?, \
         is_out_of_stock = ? WHERE id = ?",
        &[
            &p.currency,
            &p.image,
            &p.title,
            &p.current_price,
            &p.original_price,
            &p.highest_price,
            &p.lowest_price,
            &p.average_price,
            &p.discount_rate,
            &p.description,
            &p.category,
            &p.reviews_count,
            &p.stars,
            &p.is_out_of_stock,
            &id,
        ],
    )?;
    Ok(())
}

fn replace_history(conn: &Connection, id: i64, history: &[PriceHistoryItem]) -> Result<()> {
    conn.execute_update("DELETE FROM price_history WHERE product_id = ?", &[&id])?;
    for (seq, item) in history.iter().enumerate() {
        let seq = seq as i64;
        conn.execute_update(
            "INSERT INTO price_history (product_id, seq, price) VALUES (?, ?, ?)",
            &[&id, &seq, &item.price],
        )?;
    }
    Ok(())
}

fn merge_subscribers(conn: &Connection, id: i64, users: &[User]) -> Result<()> {
    for user in users {
        conn.execute_update(
            "INSERT INTO subscribers (product_id, email) \
             SELECT ?, ? WHERE NOT EXISTS \
             (SELECT 1 FROM subscribers WHERE product_id = ? AND email = ?)",
            &[&id, &user.email, &id, &user.email],
        )?;
    }
    Ok(())
}
