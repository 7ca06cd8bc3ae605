//! Shared test harness for storage backend testing
//!
//! Provides record builders and the `store_contract_tests!` macro, which
//! validates any [`Stores`] bundle against the store trait contracts.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//!
//! use store_harness::*;
//!
//! store_contract_tests!(Stores::in_memory());
//! ```

#![allow(dead_code)]

use bookstore::core::model::{Address, Book, Category, Order, OrderLine};
use chrono::{Duration, Utc};
use uuid::Uuid;

pub fn book(title: &str, price: f64, category: Category) -> Book {
    Book::new(title, "Test Author", price, category)
}

pub fn address(user: Uuid, street: &str) -> Address {
    Address {
        id: Uuid::new_v4(),
        user,
        name: "Test User".to_string(),
        street: street.to_string(),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        pincode: "411001".to_string(),
        phone: "9999999999".to_string(),
        created_at: Utc::now(),
    }
}

/// An order placed `minutes_ago` minutes in the past
pub fn order_placed(user: Uuid, book: &Book, quantity: u32, minutes_ago: i64) -> Order {
    let mut order = Order::place(user, Uuid::new_v4(), vec![OrderLine::snapshot(book, quantity)]);
    order.created_at = Utc::now() - Duration::minutes(minutes_ago);
    order.updated_at = order.created_at;
    order
}

/// Generate a conformance suite for every store of a [`Stores`] bundle.
///
/// `$factory` is re-evaluated for each test and must produce empty stores.
/// Any trailing attributes (`#[ignore]`, ...) are applied to every test.
#[macro_export]
macro_rules! store_contract_tests {
    ($factory:expr $(, #[$attr:meta])* $(,)?) => {
        mod store_contract_tests {
            use super::*;
            use bookstore::core::model::{Category, Favorite, OrderStatus};
            use chrono::{Duration, Utc};
            use uuid::Uuid;

            // ==================================================================
            // Catalog
            // ==================================================================

            #[tokio::test]
            $(#[$attr])*
            async fn test_catalog_insert_find_replace_delete() {
                let stores = $factory;
                let mut dune = stores
                    .catalog
                    .insert(book("Dune", 300.0, Category::Fiction).with_image_url("dune.jpg"))
                    .await
                    .unwrap();

                let found = stores.catalog.find_by_id(&dune.id).await.unwrap().unwrap();
                assert_eq!(found.title, "Dune");
                assert_eq!(found.price, 300.0);
                assert_eq!(found.image_url.as_deref(), Some("dune.jpg"));

                dune.price = 350.0;
                let replaced = stores.catalog.replace(dune.clone()).await.unwrap().unwrap();
                assert_eq!(replaced.price, 350.0);

                let ghost = book("Ghost", 1.0, Category::Comics);
                assert!(stores.catalog.replace(ghost).await.unwrap().is_none());

                assert!(stores.catalog.delete(&dune.id).await.unwrap());
                assert!(!stores.catalog.delete(&dune.id).await.unwrap());
                assert!(stores.catalog.find_by_id(&dune.id).await.unwrap().is_none());
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_catalog_summary() {
                let stores = $factory;
                assert_eq!(stores.catalog.summary().await.unwrap().total_books, 0);

                for (price, category) in [
                    (100.0, Category::Fiction),
                    (200.0, Category::Fiction),
                    (300.0, Category::Comics),
                ] {
                    stores.catalog.insert(book("t", price, category)).await.unwrap();
                }

                let summary = stores.catalog.summary().await.unwrap();
                assert_eq!(summary.total_books, 3);
                assert!((summary.average_price - 200.0).abs() < 1e-9);

                let mut per_category = summary.per_category.clone();
                per_category.sort();
                assert_eq!(per_category, [(Category::Fiction, 2), (Category::Comics, 1)]);
                assert_eq!(stores.catalog.list().await.unwrap().len(), 3);
            }

            // ==================================================================
            // Cart
            // ==================================================================

            #[tokio::test]
            $(#[$attr])*
            async fn test_cart_add_or_increment_keeps_one_row() {
                let stores = $factory;
                let user = Uuid::new_v4();
                let product = Uuid::new_v4();

                let first = stores.carts.add_or_increment(&user, &product, 2).await.unwrap();
                let second = stores.carts.add_or_increment(&user, &product, 3).await.unwrap();
                assert_eq!(first.id, second.id);
                assert_eq!(second.quantity, 5);

                let items = stores.carts.find_all_by_user(&user).await.unwrap();
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].quantity, 5);
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_cart_concurrent_increments_are_not_lost() {
                let stores = $factory;
                let user = Uuid::new_v4();
                let product = Uuid::new_v4();
                stores.carts.add_or_increment(&user, &product, 1).await.unwrap();

                let adds = (0..10).map(|_| {
                    let carts = stores.carts.clone();
                    async move { carts.add_or_increment(&user, &product, 1).await }
                });
                for result in futures::future::join_all(adds).await {
                    result.unwrap();
                }

                let items = stores.carts.find_all_by_user(&user).await.unwrap();
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].quantity, 11);
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_cart_quantity_saturates() {
                let stores = $factory;
                let user = Uuid::new_v4();
                let product = Uuid::new_v4();

                stores.carts.add_or_increment(&user, &product, u32::MAX - 1).await.unwrap();
                let item = stores.carts.add_or_increment(&user, &product, 5).await.unwrap();
                assert_eq!(item.quantity, u32::MAX);

                let items = stores.carts.find_all_by_user(&user).await.unwrap();
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].quantity, u32::MAX);
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_cart_deletes_are_scoped_to_user() {
                let stores = $factory;
                let alice = Uuid::new_v4();
                let bob = Uuid::new_v4();

                let item = stores.carts.add_or_increment(&alice, &Uuid::new_v4(), 1).await.unwrap();
                stores.carts.add_or_increment(&alice, &Uuid::new_v4(), 1).await.unwrap();
                stores.carts.add_or_increment(&bob, &Uuid::new_v4(), 1).await.unwrap();

                assert!(!stores.carts.delete_for_user(&bob, &item.id).await.unwrap());
                assert!(stores.carts.delete_for_user(&alice, &item.id).await.unwrap());

                assert_eq!(stores.carts.delete_all_by_user(&alice).await.unwrap(), 1);
                assert!(stores.carts.find_all_by_user(&alice).await.unwrap().is_empty());
                assert_eq!(stores.carts.find_all_by_user(&bob).await.unwrap().len(), 1);
            }

            // ==================================================================
            // Addresses
            // ==================================================================

            #[tokio::test]
            $(#[$attr])*
            async fn test_addresses_listed_oldest_first() {
                let stores = $factory;
                let user = Uuid::new_v4();

                let mut older = address(user, "1 Old Road");
                older.created_at = Utc::now() - Duration::hours(1);
                let newer = address(user, "2 New Road");

                stores.addresses.insert(newer.clone()).await.unwrap();
                stores.addresses.insert(older.clone()).await.unwrap();
                stores.addresses.insert(address(Uuid::new_v4(), "elsewhere")).await.unwrap();

                let listed = stores.addresses.list_by_user(&user).await.unwrap();
                let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
                assert_eq!(ids, [older.id, newer.id]);

                let found = stores.addresses.find_by_id(&newer.id).await.unwrap().unwrap();
                assert_eq!(found.street, "2 New Road");
                assert!(stores.addresses.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
            }

            // ==================================================================
            // Orders
            // ==================================================================

            #[tokio::test]
            $(#[$attr])*
            async fn test_orders_listed_newest_first() {
                let stores = $factory;
                let user = Uuid::new_v4();
                let dune = book("Dune", 100.0, Category::Fiction);

                let old = order_placed(user, &dune, 1, 30);
                let new = order_placed(user, &dune, 2, 1);
                let other = order_placed(Uuid::new_v4(), &dune, 1, 10);
                for order in [old.clone(), new.clone(), other.clone()] {
                    stores.orders.insert(order).await.unwrap();
                }

                let mine: Vec<_> = stores
                    .orders
                    .list_by_user(&user)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|o| o.id)
                    .collect();
                assert_eq!(mine, [new.id, old.id]);

                let all: Vec<_> = stores
                    .orders
                    .list_all()
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|o| o.id)
                    .collect();
                assert_eq!(all, [new.id, other.id, old.id]);
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_order_set_status() {
                let stores = $factory;
                let dune = book("Dune", 100.0, Category::Fiction);
                let order = stores
                    .orders
                    .insert(order_placed(Uuid::new_v4(), &dune, 3, 0))
                    .await
                    .unwrap();

                let updated = stores
                    .orders
                    .set_status(&order.id, OrderStatus::Pending, OrderStatus::Confirmed, Utc::now())
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(updated.status, OrderStatus::Confirmed);
                assert_eq!(updated.total_amount, 300.0);
                assert_eq!(updated.products, order.products);

                let stored = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
                assert_eq!(stored.status, OrderStatus::Confirmed);

                assert!(stores
                    .orders
                    .set_status(&Uuid::new_v4(), OrderStatus::Confirmed, OrderStatus::Shipped, Utc::now())
                    .await
                    .unwrap()
                    .is_none());
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_order_set_status_from_stale_status_is_refused() {
                let stores = $factory;
                let dune = book("Dune", 100.0, Category::Fiction);
                let order = stores
                    .orders
                    .insert(order_placed(Uuid::new_v4(), &dune, 1, 0))
                    .await
                    .unwrap();

                stores
                    .orders
                    .set_status(&order.id, OrderStatus::Pending, OrderStatus::Confirmed, Utc::now())
                    .await
                    .unwrap()
                    .unwrap();

                let stale = stores
                    .orders
                    .set_status(&order.id, OrderStatus::Pending, OrderStatus::Cancelled, Utc::now())
                    .await
                    .unwrap();
                assert!(stale.is_none());

                let stored = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
                assert_eq!(stored.status, OrderStatus::Confirmed);
            }

            // ==================================================================
            // Favorites
            // ==================================================================

            #[tokio::test]
            $(#[$attr])*
            async fn test_favorites_find_list_delete() {
                let stores = $factory;
                let user = Uuid::new_v4();
                let first_product = Uuid::new_v4();
                let second_product = Uuid::new_v4();

                let mut first = Favorite::new(user, first_product);
                first.created_at = Utc::now() - Duration::minutes(5);
                stores.favorites.insert(first.clone()).await.unwrap();
                let second = stores
                    .favorites
                    .insert(Favorite::new(user, second_product))
                    .await
                    .unwrap();

                assert!(stores.favorites.find(&user, &first_product).await.unwrap().is_some());
                assert!(stores.favorites.find(&Uuid::new_v4(), &first_product).await.unwrap().is_none());

                let ids: Vec<_> = stores
                    .favorites
                    .list_by_user(&user)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|f| f.id)
                    .collect();
                assert_eq!(ids, [second.id, first.id]);

                assert!(stores.favorites.delete(&user, &first_product).await.unwrap());
                assert!(!stores.favorites.delete(&user, &first_product).await.unwrap());
            }

            #[tokio::test]
            $(#[$attr])*
            async fn test_duplicate_favorite_is_rejected() {
                let stores = $factory;
                let user = Uuid::new_v4();
                let product = Uuid::new_v4();

                stores.favorites.insert(Favorite::new(user, product)).await.unwrap();
                assert!(stores.favorites.insert(Favorite::new(user, product)).await.is_err());
            }
        }
    };
}
