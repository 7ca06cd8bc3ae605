//! Cart service: per-user line items
//!
//! Adding a book already in the cart increments its quantity instead of
//! creating a second row; the store performs this in one atomic operation.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::commands::AddToCart;
use crate::core::error::{BookstoreError, ServiceResult};
use crate::core::model::{BookSummary, CartItem};
use crate::core::service::{CartStore, CatalogStore};
use crate::storage::Stores;

/// A cart row with its book resolved; `product` is `None` if the book was
/// removed from the catalog after it was added
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product: Option<BookSummary>,
    pub quantity: u32,
}

#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            catalog: stores.catalog.clone(),
            carts: stores.carts.clone(),
        }
    }

    pub async fn add_to_cart(&self, user: Uuid, cmd: AddToCart) -> ServiceResult<CartItem> {
        cmd.validate()?;
        let quantity = cmd.quantity();

        self.catalog
            .find_by_id(&cmd.product_id)
            .await
            .map_err(BookstoreError::storage)?
            .ok_or_else(|| BookstoreError::not_found("product", cmd.product_id))?;

        let item = self
            .carts
            .add_or_increment(&user, &cmd.product_id, quantity)
            .await
            .map_err(BookstoreError::storage)?;
        tracing::debug!(user_id = %user, product_id = %cmd.product_id, quantity = item.quantity, "cart updated");
        Ok(item)
    }

    pub async fn get_cart(&self, user: Uuid) -> ServiceResult<Vec<CartLine>> {
        let items = self
            .carts
            .find_all_by_user(&user)
            .await
            .map_err(BookstoreError::storage)?;

        let mut books: HashMap<Uuid, Option<BookSummary>> = HashMap::new();
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            if !books.contains_key(&item.product) {
                let book = self
                    .catalog
                    .find_by_id(&item.product)
                    .await
                    .map_err(BookstoreError::storage)?;
                books.insert(item.product, book.as_ref().map(|b| b.summary()));
            }
            lines.push(CartLine {
                id: item.id,
                product: books.get(&item.product).cloned().flatten(),
                quantity: item.quantity,
            });
        }
        Ok(lines)
    }

    /// Remove one row; rows of other users are reported as not found
    pub async fn remove_from_cart(&self, user: Uuid, item_id: Uuid) -> ServiceResult<()> {
        let removed = self
            .carts
            .delete_for_user(&user, &item_id)
            .await
            .map_err(BookstoreError::storage)?;
        if !removed {
            return Err(BookstoreError::not_found("cart item", item_id));
        }
        Ok(())
    }

    /// Empty the cart; returns how many rows were removed
    pub async fn clear_cart(&self, user: Uuid) -> ServiceResult<u64> {
        self.carts
            .delete_all_by_user(&user)
            .await
            .map_err(BookstoreError::storage)
    }
}
