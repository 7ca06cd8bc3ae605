//! Core module containing the domain model, commands, errors and store traits

pub mod auth;
pub mod commands;
pub mod error;
pub mod model;
pub mod service;

pub use auth::{AuthContext, AuthPolicy};
pub use error::{BookstoreError, ErrorResponse, ServiceResult};
pub use model::{
    Address, Book, BookSummary, CartItem, Category, Favorite, Order, OrderLine, OrderStatus,
    PaymentMethod,
};
pub use service::{AddressStore, CartStore, CatalogStore, CatalogSummary, FavoriteStore, OrderStore};
