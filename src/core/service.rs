//! Store traits for the persisted collections
//!
//! The service layer only talks to these traits; storage backends
//! (in-memory, MongoDB) implement them. Every method reports failures through
//! `anyhow::Result`, and "absent" is expressed with `Option` or `bool` rather
//! than an error.

use crate::core::model::{Address, Book, CartItem, Category, Favorite, Order, OrderStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Raw catalog aggregates computed by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSummary {
    pub total_books: u64,
    /// Mean price, 0 for an empty catalog
    pub average_price: f64,
    /// Count per category, in no particular order
    pub per_category: Vec<(Category, u64)>,
}

/// Catalog store: book records
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert(&self, book: Book) -> Result<Book>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Book>>;

    async fn list(&self) -> Result<Vec<Book>>;

    /// Replace a stored book; `None` when no book has that id
    async fn replace(&self, book: Book) -> Result<Option<Book>>;

    /// Returns whether a book was removed
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    async fn summary(&self) -> Result<CatalogSummary>;
}

/// Cart store: per-user line items
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_all_by_user(&self, user: &Uuid) -> Result<Vec<CartItem>>;

    /// Create the (user, product) row or add `quantity` to the existing one,
    /// as a single atomic store operation.
    async fn add_or_increment(&self, user: &Uuid, product: &Uuid, quantity: u32)
        -> Result<CartItem>;

    /// Delete one row if it belongs to `user`; returns whether a row was removed
    async fn delete_for_user(&self, user: &Uuid, id: &Uuid) -> Result<bool>;

    /// Delete every row of `user`; returns the number removed
    async fn delete_all_by_user(&self, user: &Uuid) -> Result<u64>;
}

/// Address store: per-user delivery addresses
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn insert(&self, address: Address) -> Result<Address>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Address>>;

    /// Addresses of `user` in creation order (oldest first)
    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Address>>;
}

/// Order store: placed orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<Order>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>>;

    /// Orders of `user`, newest first
    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Order>>;

    /// Every order, newest first
    async fn list_all(&self) -> Result<Vec<Order>>;

    /// Move an order from `from` to `to` as one atomic compare-and-set
    ///
    /// Returns `None` when no order with that id is currently in `from`,
    /// either because it does not exist or because another transition got
    /// there first.
    async fn set_status(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Order>>;
}

/// Favorite store: (user, product) bookmarks
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn find(&self, user: &Uuid, product: &Uuid) -> Result<Option<Favorite>>;

    async fn insert(&self, favorite: Favorite) -> Result<Favorite>;

    /// Favorites of `user`, newest first
    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Favorite>>;

    /// Returns whether a favorite was removed
    async fn delete(&self, user: &Uuid, product: &Uuid) -> Result<bool>;
}
