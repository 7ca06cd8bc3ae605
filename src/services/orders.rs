//! Order service: placement, listing, cancellation and status administration
//!
//! This is the only service that reads across several stores within one
//! operation. Placement copies the name, image and price of every line from
//! the catalog into the order, so later catalog edits never change a placed
//! order. The total is fixed at placement and never recomputed.
//!
//! # Lifecycle
//!
//! ```text
//! pending ──► confirmed ──► shipped ──► delivered
//!    │
//!    └──► cancelled
//! ```
//!
//! Customers can only cancel their own pending orders. Every forward step is
//! an administrative capability ([`OrderService::update_status`]); who holds
//! it is decided by the caller's [`AuthPolicy`](crate::core::AuthPolicy).

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::commands::{PlaceCartOrder, PlaceSingleOrder};
use crate::core::error::{BookstoreError, ServiceResult, TransitionError};
use crate::core::model::{Address, Book, Order, OrderLine, OrderStatus, PaymentMethod};
use crate::core::service::{AddressStore, CartStore, CatalogStore, OrderStore};
use crate::storage::Stores;

/// Book fields resolved when listing orders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Address fields resolved when listing orders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRef {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub phone: String,
    pub pincode: String,
}

impl From<&Address> for AddressRef {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            street: address.street.clone(),
            city: address.city.clone(),
            phone: address.phone.clone(),
            pincode: address.pincode.clone(),
        }
    }
}

/// An order line with its book resolved at read time
///
/// `product` is `None` once the book has been removed from the catalog; the
/// snapshot fields still describe what was bought.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub product: Option<ProductRef>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price: f64,
    pub quantity: u32,
}

/// An order with books and address resolved, as returned by `GET /orders/my`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user: Uuid,
    pub products: Vec<OrderLineView>,
    pub address: Option<AddressRef>,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn CartStore>,
    addresses: Arc<dyn AddressStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            catalog: stores.catalog.clone(),
            carts: stores.carts.clone(),
            addresses: stores.addresses.clone(),
            orders: stores.orders.clone(),
        }
    }

    /// Place an order for a single book without touching the cart
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product does not resolve to a book
    /// - `InvalidInput` if the address is missing or not owned by `user`,
    ///   or the quantity is below 1
    pub async fn place_single_order(
        &self,
        user: Uuid,
        cmd: PlaceSingleOrder,
    ) -> ServiceResult<Order> {
        cmd.validate()?;

        let book = self
            .catalog
            .find_by_id(&cmd.product_id)
            .await
            .map_err(BookstoreError::storage)?
            .ok_or_else(|| BookstoreError::not_found("product", cmd.product_id))?;

        let address_id = cmd
            .address_id
            .ok_or_else(|| BookstoreError::invalid_input("Address is required"))?;
        self.owned_address(user, address_id).await?;

        let quantity = cmd.quantity.unwrap_or(1);
        let order = Order::place(user, address_id, vec![OrderLine::snapshot(&book, quantity)]);

        let order = self
            .orders
            .insert(order)
            .await
            .map_err(BookstoreError::storage)?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user,
            product_id = %book.id,
            quantity,
            total = order.total_amount,
            "single order placed"
        );
        Ok(order)
    }

    /// Convert the whole cart of `user` into one order, then empty the cart
    ///
    /// The cart is cleared only after the order has been persisted. If any
    /// earlier step fails the cart is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the cart is empty, or the address is missing or
    ///   not owned by `user`
    /// - `NotFound` if a cart line references a book that no longer exists
    pub async fn place_cart_order(&self, user: Uuid, cmd: PlaceCartOrder) -> ServiceResult<Order> {
        let items = self
            .carts
            .find_all_by_user(&user)
            .await
            .map_err(BookstoreError::storage)?;
        if items.is_empty() {
            return Err(BookstoreError::invalid_input("Cart is empty"));
        }

        let address_id = cmd
            .address_id
            .ok_or_else(|| BookstoreError::invalid_input("Address is required"))?;
        self.owned_address(user, address_id).await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let book = self
                .catalog
                .find_by_id(&item.product)
                .await
                .map_err(BookstoreError::storage)?
                .ok_or_else(|| BookstoreError::not_found("product", item.product))?;
            lines.push(OrderLine::snapshot(&book, item.quantity));
        }

        let order = self
            .orders
            .insert(Order::place(user, address_id, lines))
            .await
            .map_err(BookstoreError::storage)?;

        let cleared = self.carts.delete_all_by_user(&user).await.map_err(|e| {
            tracing::error!(order_id = %order.id, user_id = %user, error = %e, "order placed but cart not cleared");
            BookstoreError::storage(e)
        })?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user,
            lines = order.products.len(),
            cleared,
            total = order.total_amount,
            "cart order placed"
        );
        Ok(order)
    }

    /// Orders of `user`, newest first, with books and address resolved
    pub async fn my_orders(&self, user: Uuid) -> ServiceResult<Vec<OrderView>> {
        let orders = self
            .orders
            .list_by_user(&user)
            .await
            .map_err(BookstoreError::storage)?;

        let mut books: HashMap<Uuid, Option<Book>> = HashMap::new();
        let mut addresses: HashMap<Uuid, Option<Address>> = HashMap::new();
        let mut views = Vec::with_capacity(orders.len());

        for order in orders {
            let mut products = Vec::with_capacity(order.products.len());
            for line in order.products {
                if !books.contains_key(&line.product) {
                    let book = self
                        .catalog
                        .find_by_id(&line.product)
                        .await
                        .map_err(BookstoreError::storage)?;
                    books.insert(line.product, book);
                }
                let product = books.get(&line.product).and_then(Option::as_ref).map(|b| ProductRef {
                    id: b.id,
                    title: b.title.clone(),
                    image_url: b.image_url.clone(),
                });
                products.push(OrderLineView {
                    product,
                    name: line.name,
                    image_url: line.image_url,
                    price: line.price,
                    quantity: line.quantity,
                });
            }

            if !addresses.contains_key(&order.address) {
                let address = self
                    .addresses
                    .find_by_id(&order.address)
                    .await
                    .map_err(BookstoreError::storage)?;
                addresses.insert(order.address, address);
            }
            let address = addresses
                .get(&order.address)
                .and_then(Option::as_ref)
                .map(AddressRef::from);

            views.push(OrderView {
                id: order.id,
                user: order.user,
                products,
                address,
                total_amount: order.total_amount,
                payment_method: order.payment_method,
                status: order.status,
                created_at: order.created_at,
                updated_at: order.updated_at,
            });
        }

        Ok(views)
    }

    /// Cancel a pending order owned by `user`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `Unauthorized` if the order belongs to another user
    /// - `InvalidState` if the order is no longer pending
    pub async fn cancel_order(&self, user: Uuid, order_id: Uuid) -> ServiceResult<Order> {
        let order = self.find(order_id).await?;

        if order.user != user {
            return Err(BookstoreError::Unauthorized(
                "Not authorized to cancel this order".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(cancel_rejected(order.status));
        }

        let cancelled = self
            .persist_status(order_id, OrderStatus::Pending, OrderStatus::Cancelled, |from, _| {
                cancel_rejected(from)
            })
            .await?;
        tracing::info!(order_id = %order_id, user_id = %user, "order cancelled");
        Ok(cancelled)
    }

    /// Every order in the system, newest first
    pub async fn list_all(&self) -> ServiceResult<Vec<Order>> {
        self.orders.list_all().await.map_err(BookstoreError::storage)
    }

    /// Move an order along its lifecycle
    ///
    /// Only the edges of the lifecycle graph are accepted; skipping a step,
    /// moving backwards or leaving a terminal status fails with `InvalidState`.
    pub async fn update_status(&self, order_id: Uuid, next: OrderStatus) -> ServiceResult<Order> {
        let order = self.find(order_id).await?;

        if !order.status.can_transition_to(next) {
            return Err(transition_rejected(order.status, next));
        }

        let updated = self
            .persist_status(order_id, order.status, next, transition_rejected)
            .await?;
        tracing::info!(order_id = %order_id, from = %order.status, to = %next, "order status updated");
        Ok(updated)
    }

    async fn find(&self, order_id: Uuid) -> ServiceResult<Order> {
        self.orders
            .find_by_id(&order_id)
            .await
            .map_err(BookstoreError::storage)?
            .ok_or_else(|| BookstoreError::not_found("order", order_id))
    }

    /// Write `to` only if the order is still in `from`
    ///
    /// When a concurrent transition moved the order first, the order is
    /// re-read and `rejected` builds the error from its current status.
    async fn persist_status(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        rejected: fn(OrderStatus, OrderStatus) -> BookstoreError,
    ) -> ServiceResult<Order> {
        let written = self
            .orders
            .set_status(&order_id, from, to, Utc::now())
            .await
            .map_err(BookstoreError::storage)?;
        if let Some(order) = written {
            return Ok(order);
        }

        let current = self.find(order_id).await?;
        tracing::warn!(
            order_id = %order_id,
            expected = %from,
            actual = %current.status,
            "order status changed concurrently"
        );
        Err(rejected(current.status, to))
    }

    /// The address must exist and belong to `user`
    async fn owned_address(&self, user: Uuid, address_id: Uuid) -> ServiceResult<Address> {
        self.addresses
            .find_by_id(&address_id)
            .await
            .map_err(BookstoreError::storage)?
            .filter(|address| address.user == user)
            .ok_or_else(|| BookstoreError::invalid_input("Address not found"))
    }
}

fn cancel_rejected(from: OrderStatus) -> BookstoreError {
    BookstoreError::InvalidState(TransitionError {
        from,
        to: OrderStatus::Cancelled,
        message: "Only pending orders can be cancelled".to_string(),
    })
}

fn transition_rejected(from: OrderStatus, to: OrderStatus) -> BookstoreError {
    let message = if from.is_terminal() {
        format!("Order is already {} and can no longer change", from)
    } else {
        format!("Cannot move order from {} to {}", from, to)
    };
    BookstoreError::InvalidState(TransitionError { from, to, message })
}
