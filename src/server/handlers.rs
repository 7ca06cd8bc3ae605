//! HTTP handlers
//!
//! Handlers only extract identity, path and body, check the route's
//! [`AuthPolicy`] and call into [`Services`]. Every failure is a
//! [`BookstoreError`], which renders itself as a JSON error response.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::core::auth::{AuthContext, AuthPolicy};
use crate::core::commands::{
    AddFavorite, AddToCart, BookPatch, BookQuery, CreateBook, NewAddress, PlaceCartOrder,
    PlaceSingleOrder, UpdateOrderStatus,
};
use crate::core::error::{BookstoreError, InputError, ServiceResult};
use crate::core::model::{Address, Book, Order};
use crate::services::{
    CartLine, DashboardStats, FavoriteView, OrderView, Services,
};

/// Parse a path segment as an identifier
pub fn parse_id(raw: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| BookstoreError::InvalidInput(InputError::InvalidId(raw.to_string())))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServiceResult<T> {
    payload.map(|Json(value)| value).map_err(BookstoreError::from)
}

fn created<T: Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

// =============================================================================
// Health
// =============================================================================

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bookstore"
    }))
}

// =============================================================================
// Catalog
// =============================================================================

pub async fn list_books(
    State(services): State<Services>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> ServiceResult<Json<Vec<Book>>> {
    let Query(query) =
        query.map_err(|e| BookstoreError::InvalidInput(InputError::Body(e.body_text())))?;
    Ok(Json(services.catalog.list_books(query).await?))
}

pub async fn get_book(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Book>> {
    Ok(Json(services.catalog.get_book(parse_id(&id)?).await?))
}

pub async fn create_book(
    State(services): State<Services>,
    auth: AuthContext,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> ServiceResult<Response> {
    auth.require(AuthPolicy::AdminOnly)?;
    let book = services.catalog.create_book(body(payload)?).await?;
    Ok(created(book))
}

pub async fn update_book(
    State(services): State<Services>,
    auth: AuthContext,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> ServiceResult<Json<Book>> {
    auth.require(AuthPolicy::AdminOnly)?;
    let id = parse_id(&id)?;
    Ok(Json(services.catalog.update_book(id, body(payload)?).await?))
}

pub async fn delete_book(
    State(services): State<Services>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    auth.require(AuthPolicy::AdminOnly)?;
    services.catalog.delete_book(parse_id(&id)?).await?;
    Ok(message("Book deleted successfully"))
}

// =============================================================================
// Cart
// =============================================================================

pub async fn get_cart(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Vec<CartLine>>> {
    let user = auth.require_user()?;
    Ok(Json(services.cart.get_cart(user).await?))
}

pub async fn add_to_cart(
    State(services): State<Services>,
    auth: AuthContext,
    payload: Result<Json<AddToCart>, JsonRejection>,
) -> ServiceResult<Response> {
    let user = auth.require_user()?;
    let item = services.cart.add_to_cart(user, body(payload)?).await?;
    Ok(created(item))
}

pub async fn remove_cart_item(
    State(services): State<Services>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let user = auth.require_user()?;
    services.cart.remove_from_cart(user, parse_id(&id)?).await?;
    Ok(message("Item removed successfully"))
}

pub async fn clear_cart(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Value>> {
    let user = auth.require_user()?;
    let removed = services.cart.clear_cart(user).await?;
    Ok(Json(json!({ "message": "Cart cleared", "removed": removed })))
}

// =============================================================================
// Addresses
// =============================================================================

pub async fn list_addresses(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Vec<Address>>> {
    let user = auth.require_user()?;
    Ok(Json(services.addresses.list_addresses(user).await?))
}

pub async fn add_address(
    State(services): State<Services>,
    auth: AuthContext,
    payload: Result<Json<NewAddress>, JsonRejection>,
) -> ServiceResult<Response> {
    let user = auth.require_user()?;
    let address = services.addresses.add_address(user, body(payload)?).await?;
    Ok(created(address))
}

pub async fn get_address(
    State(services): State<Services>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ServiceResult<Json<Address>> {
    let user = auth.require_user()?;
    Ok(Json(services.addresses.get_address(user, parse_id(&id)?).await?))
}

/// Most recent address, or `null` when the user has none
pub async fn default_address(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Option<Address>>> {
    let user = auth.require_user()?;
    Ok(Json(services.addresses.default_address(user).await?))
}

// =============================================================================
// Favorites
// =============================================================================

pub async fn list_favorites(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Vec<FavoriteView>>> {
    let user = auth.require_user()?;
    Ok(Json(services.favorites.list_favorites(user).await?))
}

pub async fn add_favorite(
    State(services): State<Services>,
    auth: AuthContext,
    payload: Result<Json<AddFavorite>, JsonRejection>,
) -> ServiceResult<Response> {
    let user = auth.require_user()?;
    let AddFavorite { product_id } = body(payload)?;
    let favorite = services.favorites.add_favorite(user, product_id).await?;
    Ok(created(favorite))
}

pub async fn remove_favorite(
    State(services): State<Services>,
    auth: AuthContext,
    Path(product_id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let user = auth.require_user()?;
    services
        .favorites
        .remove_favorite(user, parse_id(&product_id)?)
        .await?;
    Ok(message("Removed from favorites"))
}

// =============================================================================
// Orders
// =============================================================================

pub async fn place_single_order(
    State(services): State<Services>,
    auth: AuthContext,
    payload: Result<Json<PlaceSingleOrder>, JsonRejection>,
) -> ServiceResult<Response> {
    let user = auth.require_user()?;
    let order = services.orders.place_single_order(user, body(payload)?).await?;
    Ok(created(order))
}

pub async fn place_cart_order(
    State(services): State<Services>,
    auth: AuthContext,
    payload: Result<Json<PlaceCartOrder>, JsonRejection>,
) -> ServiceResult<Response> {
    let user = auth.require_user()?;
    let order = services.orders.place_cart_order(user, body(payload)?).await?;
    Ok(created(order))
}

pub async fn my_orders(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Vec<OrderView>>> {
    let user = auth.require_user()?;
    Ok(Json(services.orders.my_orders(user).await?))
}

#[derive(Debug, Serialize)]
pub struct CancelledOrder {
    pub message: &'static str,
    pub order: Order,
}

pub async fn cancel_order(
    State(services): State<Services>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ServiceResult<Json<CancelledOrder>> {
    let user = auth.require_user()?;
    let order = services.orders.cancel_order(user, parse_id(&id)?).await?;
    Ok(Json(CancelledOrder {
        message: "Order cancelled successfully",
        order,
    }))
}

pub async fn list_all_orders(
    State(services): State<Services>,
    auth: AuthContext,
) -> ServiceResult<Json<Vec<Order>>> {
    auth.require(AuthPolicy::AdminOnly)?;
    Ok(Json(services.orders.list_all().await?))
}

pub async fn update_order_status(
    State(services): State<Services>,
    auth: AuthContext,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderStatus>, JsonRejection>,
) -> ServiceResult<Json<Order>> {
    auth.require(AuthPolicy::AdminOnly)?;
    let id = parse_id(&id)?;
    let UpdateOrderStatus { status } = body(payload)?;
    Ok(Json(services.orders.update_status(id, status).await?))
}

// =============================================================================
// Dashboard
// =============================================================================

pub async fn dashboard_stats(
    State(services): State<Services>,
) -> ServiceResult<Json<DashboardStats>> {
    Ok(Json(services.dashboard.stats().await?))
}
