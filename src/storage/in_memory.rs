//! In-memory store implementations for testing and development

use crate::core::model::{Address, Book, CartItem, Category, Favorite, Order, OrderStatus};
use crate::core::service::{
    AddressStore, CartStore, CatalogStore, CatalogSummary, FavoriteStore, OrderStore,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// A `Uuid`-keyed collection guarded by an `RwLock`, kept in insertion order
#[derive(Debug)]
struct Collection<T> {
    rows: Arc<RwLock<IndexMap<Uuid, T>>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(IndexMap::new())),
        }
    }
}

impl<T> Collection<T> {
    fn read(&self) -> Result<RwLockReadGuard<'_, IndexMap<Uuid, T>>> {
        self.rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexMap<Uuid, T>>> {
        self.rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogStore {
    books: Collection<Book>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert(&self, book: Book) -> Result<Book> {
        self.books.write()?.insert(book.id, book.clone());
        Ok(book)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Book>> {
        Ok(self.books.read()?.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self.books.read()?.values().cloned().collect();
        books.sort_by_key(|b| b.created_at);
        Ok(books)
    }

    async fn replace(&self, book: Book) -> Result<Option<Book>> {
        let mut books = self.books.write()?;
        match books.get_mut(&book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        Ok(self.books.write()?.shift_remove(id).is_some())
    }

    async fn summary(&self) -> Result<CatalogSummary> {
        let books = self.books.read()?;
        let total_books = books.len() as u64;
        let average_price = if books.is_empty() {
            0.0
        } else {
            books.values().map(|b| b.price).sum::<f64>() / books.len() as f64
        };

        let mut counts: BTreeMap<Category, u64> = BTreeMap::new();
        for book in books.values() {
            *counts.entry(book.category).or_default() += 1;
        }

        Ok(CatalogSummary {
            total_books,
            average_price,
            per_category: counts.into_iter().collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    items: Collection<CartItem>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_all_by_user(&self, user: &Uuid) -> Result<Vec<CartItem>> {
        let mut items: Vec<CartItem> = self
            .items
            .read()?
            .values()
            .filter(|item| &item.user == user)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }

    async fn add_or_increment(
        &self,
        user: &Uuid,
        product: &Uuid,
        quantity: u32,
    ) -> Result<CartItem> {
        // Lookup and update happen under one write lock
        let mut items = self.items.write()?;

        if let Some(existing) = items
            .values_mut()
            .find(|item| &item.user == user && &item.product == product)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let item = CartItem::new(*user, *product, quantity);
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_for_user(&self, user: &Uuid, id: &Uuid) -> Result<bool> {
        let mut items = self.items.write()?;
        match items.get(id) {
            Some(item) if &item.user == user => {
                items.shift_remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_all_by_user(&self, user: &Uuid) -> Result<u64> {
        let mut items = self.items.write()?;
        let before = items.len();
        items.retain(|_, item| &item.user != user);
        Ok((before - items.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressStore {
    addresses: Collection<Address>,
}

impl InMemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn insert(&self, address: Address) -> Result<Address> {
        self.addresses.write()?.insert(address.id, address.clone());
        Ok(address)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Address>> {
        Ok(self.addresses.read()?.get(id).cloned())
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Address>> {
        let mut addresses: Vec<Address> = self
            .addresses
            .read()?
            .values()
            .filter(|a| &a.user == user)
            .cloned()
            .collect();
        addresses.sort_by_key(|a| a.created_at);
        Ok(addresses)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Collection<Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Expects insertion order reversed, so equal timestamps keep the latest first
fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        self.orders.write()?.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>> {
        Ok(self.orders.read()?.get(id).cloned())
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Order>> {
        let orders = self
            .orders
            .read()?
            .values()
            .rev()
            .filter(|o| &o.user == user)
            .cloned()
            .collect();
        Ok(newest_first(orders))
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read()?.values().rev().cloned().collect();
        Ok(newest_first(orders))
    }

    async fn set_status(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Order>> {
        // Status check and write happen under one write lock
        let mut orders = self.orders.write()?;
        Ok(orders
            .get_mut(id)
            .filter(|order| order.status == from)
            .map(|order| {
                order.status = to;
                order.updated_at = updated_at;
                order.clone()
            }))
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct InMemoryFavoriteStore {
    favorites: Collection<Favorite>,
}

impl InMemoryFavoriteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoriteStore for InMemoryFavoriteStore {
    async fn find(&self, user: &Uuid, product: &Uuid) -> Result<Option<Favorite>> {
        Ok(self
            .favorites
            .read()?
            .values()
            .find(|f| &f.user == user && &f.product == product)
            .cloned())
    }

    async fn insert(&self, favorite: Favorite) -> Result<Favorite> {
        let mut favorites = self.favorites.write()?;
        if favorites
            .values()
            .any(|f| f.user == favorite.user && f.product == favorite.product)
        {
            return Err(anyhow!(
                "Duplicate favorite for user {} and product {}",
                favorite.user,
                favorite.product
            ));
        }
        favorites.insert(favorite.id, favorite.clone());
        Ok(favorite)
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Favorite>> {
        let mut favorites: Vec<Favorite> = self
            .favorites
            .read()?
            .values()
            .rev()
            .filter(|f| &f.user == user)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn delete(&self, user: &Uuid, product: &Uuid) -> Result<bool> {
        let mut favorites = self.favorites.write()?;
        let before = favorites.len();
        favorites.retain(|_, f| !(&f.user == user && &f.product == product));
        Ok(favorites.len() < before)
    }
}
