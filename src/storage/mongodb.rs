//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! One collection per resource: `books`, `carts`, `addresses`, `orders`,
//! `favorites`. Records are serialized via `serde_json::Value` and converted to
//! BSON documents, so UUIDs are stored as strings and timestamps as RFC 3339
//! strings. The `id` field is mapped to MongoDB's `_id` convention.
//!
//! Newest-first / creation-order listings are sorted after loading, on the
//! parsed `DateTime` values, because RFC 3339 strings with varying fractional
//! precision do not sort lexicographically.

use crate::core::model::{Address, Book, CartItem, Category, Favorite, Order, OrderStatus};
use crate::core::service::{
    AddressStore, CartStore, CatalogStore, CatalogSummary, FavoriteStore, OrderStore,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument, UpdateModifications};
use mongodb::{Collection, Database, IndexModel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use uuid::Uuid;

pub const BOOKS: &str = "books";
pub const CARTS: &str = "carts";
pub const ADDRESSES: &str = "addresses";
pub const ORDERS: &str = "orders";
pub const FAVORITES: &str = "favorites";

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val =
        mongodb::bson::to_bson(&json).map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

/// Same textual form serde uses for `DateTime<Utc>`
fn timestamp_bson(at: DateTime<Utc>) -> Bson {
    Bson::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Typed view over one collection
struct Records<T> {
    collection: Collection<Document>,
    _marker: PhantomData<T>,
}

impl<T> Clone for Records<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Records<T> {
    fn new(database: &Database, name: &str) -> Self {
        Self {
            collection: database.collection(name),
            _marker: PhantomData,
        }
    }

    fn to_document(record: &T) -> Result<Document> {
        let json = serde_json::to_value(record)
            .map_err(|e| anyhow!("Failed to serialize record: {}", e))?;
        json_to_document(json)
    }

    fn from_document(doc: Document) -> Result<T> {
        serde_json::from_value(document_to_json(doc))
            .map_err(|e| anyhow!("Failed to deserialize record from document: {}", e))
    }

    async fn insert(&self, record: T) -> Result<T> {
        let doc = Self::to_document(&record)?;
        self.collection
            .insert_one(doc)
            .await
            .with_context(|| format!("Failed to insert into {}", self.collection.name()))?;
        Ok(record)
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.collection
            .find_one(filter)
            .await
            .with_context(|| format!("Failed to query {}", self.collection.name()))?
            .map(Self::from_document)
            .transpose()
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<T>> {
        let cursor = self
            .collection
            .find(filter)
            .await
            .with_context(|| format!("Failed to query {}", self.collection.name()))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .with_context(|| format!("Failed to collect {}", self.collection.name()))?;

        docs.into_iter().map(Self::from_document).collect()
    }

    async fn update_returning(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>> {
        let update: UpdateModifications = update.into();
        self.collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .with_context(|| format!("Failed to update {}", self.collection.name()))?
            .map(Self::from_document)
            .transpose()
    }
}

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn bson_count(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) => n.max(0.0) as u64,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MongoCatalogStore {
    books: Records<Book>,
}

impl MongoCatalogStore {
    pub fn new(database: &Database) -> Self {
        Self {
            books: Records::new(database, BOOKS),
        }
    }
}

#[async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn insert(&self, book: Book) -> Result<Book> {
        self.books.insert(book).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Book>> {
        self.books.find_one(doc! { "_id": uuid_bson(id) }).await
    }

    async fn list(&self) -> Result<Vec<Book>> {
        let mut books = self.books.find_many(doc! {}).await?;
        books.sort_by_key(|b| b.created_at);
        Ok(books)
    }

    async fn replace(&self, book: Book) -> Result<Option<Book>> {
        let doc = Records::<Book>::to_document(&book)?;
        let result = self
            .books
            .collection
            .replace_one(doc! { "_id": uuid_bson(&book.id) }, doc)
            .await
            .context("Failed to replace book")?;

        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(book))
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .books
            .collection
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .context("Failed to delete book")?;
        Ok(result.deleted_count > 0)
    }

    async fn summary(&self) -> Result<CatalogSummary> {
        let collection = &self.books.collection;

        let total_books = collection
            .count_documents(doc! {})
            .await
            .context("Failed to count books")?;

        let averages: Vec<Document> = collection
            .aggregate(vec![doc! { "$group": { "_id": Bson::Null, "avgPrice": { "$avg": "$price" } } }])
            .await
            .context("Failed to aggregate average price")?
            .try_collect()
            .await?;
        let average_price = averages
            .first()
            .and_then(|d| d.get_f64("avgPrice").ok())
            .unwrap_or(0.0);

        let groups: Vec<Document> = collection
            .aggregate(vec![doc! { "$group": { "_id": "$category", "count": { "$sum": 1 } } }])
            .await
            .context("Failed to aggregate categories")?
            .try_collect()
            .await?;

        let mut per_category = Vec::with_capacity(groups.len());
        for group in groups {
            let name = group.get_str("_id").unwrap_or_default();
            match name.parse::<Category>() {
                Ok(category) => per_category.push((category, bson_count(group.get("count")))),
                Err(e) => tracing::warn!(category = name, error = %e, "skipping unknown category"),
            }
        }

        Ok(CatalogSummary {
            total_books,
            average_price,
            per_category,
        })
    }
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MongoCartStore {
    items: Records<CartItem>,
}

impl MongoCartStore {
    pub fn new(database: &Database) -> Self {
        Self {
            items: Records::new(database, CARTS),
        }
    }
}

#[async_trait]
impl CartStore for MongoCartStore {
    async fn find_all_by_user(&self, user: &Uuid) -> Result<Vec<CartItem>> {
        let mut items = self.items.find_many(doc! { "user": uuid_bson(user) }).await?;
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }

    async fn add_or_increment(
        &self,
        user: &Uuid,
        product: &Uuid,
        quantity: u32,
    ) -> Result<CartItem> {
        let filter = doc! { "user": uuid_bson(user), "product": uuid_bson(product) };

        // Saturates at u32::MAX like the in-memory store, so rows always deserialize
        let increment = |now: DateTime<Utc>| {
            vec![doc! {
                "$set": {
                    "quantity": {
                        "$min": [
                            { "$add": ["$quantity", i64::from(quantity)] },
                            i64::from(u32::MAX),
                        ]
                    },
                    "updatedAt": timestamp_bson(now),
                }
            }]
        };

        if let Some(item) = self
            .items
            .update_returning(filter.clone(), increment(Utc::now()))
            .await?
        {
            return Ok(item);
        }

        let item = CartItem::new(*user, *product, quantity);
        let doc = Records::<CartItem>::to_document(&item)?;
        match self.items.collection.insert_one(doc).await {
            Ok(_) => Ok(item),
            // A concurrent add created the row first; increment that one
            Err(e) if is_duplicate_key(&e) => self
                .items
                .update_returning(filter, increment(Utc::now()))
                .await?
                .ok_or_else(|| anyhow!("Cart row disappeared during increment")),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to insert cart item")),
        }
    }

    async fn delete_for_user(&self, user: &Uuid, id: &Uuid) -> Result<bool> {
        let result = self
            .items
            .collection
            .delete_one(doc! { "_id": uuid_bson(id), "user": uuid_bson(user) })
            .await
            .context("Failed to delete cart item")?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_all_by_user(&self, user: &Uuid) -> Result<u64> {
        let result = self
            .items
            .collection
            .delete_many(doc! { "user": uuid_bson(user) })
            .await
            .context("Failed to clear cart")?;
        Ok(result.deleted_count)
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MongoAddressStore {
    addresses: Records<Address>,
}

impl MongoAddressStore {
    pub fn new(database: &Database) -> Self {
        Self {
            addresses: Records::new(database, ADDRESSES),
        }
    }
}

#[async_trait]
impl AddressStore for MongoAddressStore {
    async fn insert(&self, address: Address) -> Result<Address> {
        self.addresses.insert(address).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Address>> {
        self.addresses.find_one(doc! { "_id": uuid_bson(id) }).await
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Address>> {
        let mut addresses = self.addresses.find_many(doc! { "user": uuid_bson(user) }).await?;
        addresses.sort_by_key(|a| a.created_at);
        Ok(addresses)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MongoOrderStore {
    orders: Records<Order>,
}

impl MongoOrderStore {
    pub fn new(database: &Database) -> Self {
        Self {
            orders: Records::new(database, ORDERS),
        }
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        self.orders.insert(order).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>> {
        self.orders.find_one(doc! { "_id": uuid_bson(id) }).await
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Order>> {
        let mut orders = self.orders.find_many(doc! { "user": uuid_bson(user) }).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let mut orders = self.orders.find_many(doc! {}).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn set_status(
        &self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Order>> {
        let filter = doc! { "_id": uuid_bson(id), "status": from.as_str() };
        let update = doc! {
            "$set": { "status": to.as_str(), "updatedAt": timestamp_bson(updated_at) }
        };
        self.orders.update_returning(filter, update).await
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MongoFavoriteStore {
    favorites: Records<Favorite>,
}

impl MongoFavoriteStore {
    pub fn new(database: &Database) -> Self {
        Self {
            favorites: Records::new(database, FAVORITES),
        }
    }
}

#[async_trait]
impl FavoriteStore for MongoFavoriteStore {
    async fn find(&self, user: &Uuid, product: &Uuid) -> Result<Option<Favorite>> {
        self.favorites
            .find_one(doc! { "user": uuid_bson(user), "product": uuid_bson(product) })
            .await
    }

    async fn insert(&self, favorite: Favorite) -> Result<Favorite> {
        self.favorites.insert(favorite).await
    }

    async fn list_by_user(&self, user: &Uuid) -> Result<Vec<Favorite>> {
        let mut favorites = self.favorites.find_many(doc! { "user": uuid_bson(user) }).await?;
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn delete(&self, user: &Uuid, product: &Uuid) -> Result<bool> {
        let result = self
            .favorites
            .collection
            .delete_one(doc! { "user": uuid_bson(user), "product": uuid_bson(product) })
            .await
            .context("Failed to delete favorite")?;
        Ok(result.deleted_count > 0)
    }
}

/// Create the unique (user, product) indexes on `carts` and `favorites`
pub async fn ensure_indexes(database: &Database) -> Result<()> {
    for name in [CARTS, FAVORITES] {
        let index = IndexModel::builder()
            .keys(doc! { "user": 1, "product": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        database
            .collection::<Document>(name)
            .create_index(index)
            .await
            .with_context(|| format!("Failed to create unique index on {}", name))?;
    }

    let by_user = IndexModel::builder().keys(doc! { "user": 1 }).build();
    for name in [ADDRESSES, ORDERS] {
        database
            .collection::<Document>(name)
            .create_index(by_user.clone())
            .await
            .with_context(|| format!("Failed to create user index on {}", name))?;
    }

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}
