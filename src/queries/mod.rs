//! Storage query modules.
//!
//! Each module provides a query struct that borrows from a
//! [`Connection`](crate::connection::Connection) and returns typed models.

pub mod products;

pub use products::ProductQuery;
