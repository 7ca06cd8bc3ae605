//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

use crate::core::service::{AddressStore, CartStore, CatalogStore, FavoriteStore, OrderStore};
use std::sync::Arc;

pub use in_memory::{
    InMemoryAddressStore, InMemoryCartStore, InMemoryCatalogStore, InMemoryFavoriteStore,
    InMemoryOrderStore,
};
#[cfg(feature = "mongodb_backend")]
pub use self::mongodb::{
    MongoAddressStore, MongoCartStore, MongoCatalogStore, MongoFavoriteStore, MongoOrderStore,
};

/// The full set of stores the services run against
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orders: Arc<dyn OrderStore>,
    pub favorites: Arc<dyn FavoriteStore>,
}

impl Stores {
    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalogStore::new()),
            carts: Arc::new(InMemoryCartStore::new()),
            addresses: Arc::new(InMemoryAddressStore::new()),
            orders: Arc::new(InMemoryOrderStore::new()),
            favorites: Arc::new(InMemoryFavoriteStore::new()),
        }
    }

    /// Stores backed by the collections of `database`
    #[cfg(feature = "mongodb_backend")]
    pub fn mongo(database: &::mongodb::Database) -> Self {
        Self {
            catalog: Arc::new(MongoCatalogStore::new(database)),
            carts: Arc::new(MongoCartStore::new(database)),
            addresses: Arc::new(MongoAddressStore::new(database)),
            orders: Arc::new(MongoOrderStore::new(database)),
            favorites: Arc::new(MongoFavoriteStore::new(database)),
        }
    }

    /// Replace the order store, keeping the others
    pub fn with_orders(mut self, orders: impl OrderStore + 'static) -> Self {
        self.orders = Arc::new(orders);
        self
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::in_memory()
    }
}
