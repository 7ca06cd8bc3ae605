//! # Bookstore
//!
//! Backend of an online bookstore: catalog, carts, delivery addresses,
//! favorites and the order lifecycle, served as a JSON REST API with axum.
//!
//! ## Features
//!
//! - **Order lifecycle**: `pending → confirmed → shipped → delivered`, with
//!   cancellation of pending orders by their owner
//! - **Cart checkout**: a cart becomes one order and is cleared only after the
//!   order is stored
//! - **Price snapshots**: orders keep the name, image and price they were
//!   placed with
//! - **Pluggable storage**: in-memory stores, or MongoDB behind the
//!   `mongodb_backend` feature
//! - **Explicit identity**: each request carries its caller in `x-user-id` /
//!   `x-user-role` headers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bookstore::prelude::*;
//!
//! let config = AppConfig::load(None)?;
//! bookstore::init_tracing(&config.log);
//!
//! ServerBuilder::new()
//!     .with_stores(Stores::in_memory())
//!     .with_cors(config.server.cors_allow_any)
//!     .serve(&config.bind_addr())
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod services;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins over the configured filter. Calling this twice is harmless;
/// the second call keeps the first subscriber.
pub fn init_tracing(log: &config::LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy},
        commands::{
            AddFavorite, AddToCart, BookPatch, BookQuery, CreateBook, NewAddress, PlaceCartOrder,
            PlaceSingleOrder, PriceSort, UpdateOrderStatus,
        },
        error::{BookstoreError, ErrorResponse, ServiceResult},
        model::{
            Address, Book, BookSummary, CartItem, Category, Favorite, Order, OrderLine,
            OrderStatus, PaymentMethod,
        },
        service::{AddressStore, CartStore, CatalogStore, FavoriteStore, OrderStore},
    };

    // === Services ===
    pub use crate::services::{
        AddressService, CartService, CatalogService, DashboardService, FavoriteService,
        OrderService, Services,
    };

    // === Storage ===
    pub use crate::storage::Stores;

    // === Config ===
    pub use crate::config::{AppConfig, LogConfig, ServerConfig, StorageConfig};

    // === Server ===
    pub use crate::server::ServerBuilder;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
