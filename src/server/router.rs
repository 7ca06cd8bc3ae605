//! Route table

use super::handlers::*;
use crate::services::Services;
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// Health check routes; they need no state
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Every resource route, bound to `services`
///
/// - `/books`, `/books/{id}`: catalog (writes are admin only)
/// - `/cart`, `/cart/{id}`: the caller's cart
/// - `/addresses`, `/addresses/my`, `/addresses/default`, `/addresses/{id}`
/// - `/favorites`, `/favorites/{product_id}`
/// - `/orders/single`, `/orders/cart`, `/orders/my`, `/orders/cancel/{id}`
/// - `/orders`, `/orders/{id}/status`: administration
/// - `/dashboard/stats`
pub fn resource_routes(services: Services) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book)
                .put(update_book)
                .patch(update_book)
                .delete(delete_book),
        )
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", delete(remove_cart_item))
        .route("/addresses", post(add_address))
        .route("/addresses/my", get(list_addresses))
        .route("/addresses/default", get(default_address))
        .route("/addresses/{id}", get(get_address))
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/{product_id}", delete(remove_favorite))
        .route("/orders", get(list_all_orders))
        .route("/orders/single", post(place_single_order))
        .route("/orders/cart", post(place_cart_order))
        .route("/orders/my", get(my_orders))
        .route(
            "/orders/cancel/{id}",
            patch(cancel_order).post(cancel_order).delete(cancel_order),
        )
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/dashboard/stats", get(dashboard_stats))
        .with_state(services)
}
