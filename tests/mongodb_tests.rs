//! Integration tests for the MongoDB stores using the store test harness.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a MongoDB container)
//! - Feature flag `mongodb_backend` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features mongodb_backend --test mongodb_tests -- --ignored
//! ```
//!
//! # Test isolation
//!
//! All tests share a single MongoDB container (via `OnceCell`). Each test
//! gets its own database, with the unique indexes created up front.

#![cfg(feature = "mongodb_backend")]

#[macro_use]
mod store_harness;

use axum_test::TestServer;
use bookstore::server::ServerBuilder;
use bookstore::storage::Stores;
use bookstore::storage::mongodb::ensure_indexes;
use mongodb::Client;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use store_harness::*;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh database per test)
// ---------------------------------------------------------------------------

/// Holds the testcontainer handle (keeps it alive) and the connection URL.
struct MongoTestEnv {
    _container: testcontainers::ContainerAsync<Mongo>,
    connection_url: String,
}

static TEST_ENV: OnceCell<MongoTestEnv> = OnceCell::const_new();

async fn init_mongo_env() -> &'static MongoTestEnv {
    TEST_ENV
        .get_or_init(|| async {
            let container = Mongo::default()
                .start()
                .await
                .expect("Failed to start MongoDB container (is Docker running?)");
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(27017).await.unwrap();
            MongoTestEnv {
                connection_url: format!("mongodb://{}:{}", host, port),
                _container: container,
            }
        })
        .await
}

/// Atomic counter to generate unique database names per test.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

async fn mongo_stores() -> Stores {
    let env = init_mongo_env().await;
    let client = Client::with_uri_str(&env.connection_url)
        .await
        .expect("Failed to connect to MongoDB");
    let db_num = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let database = client.database(&format!("bookstore_test_{}", db_num));
    ensure_indexes(&database)
        .await
        .expect("Failed to create indexes");
    Stores::mongo(&database)
}

// ---------------------------------------------------------------------------
// Contract suite
// ---------------------------------------------------------------------------

store_contract_tests!(mongo_stores().await, #[ignore = "requires Docker"]);

// ---------------------------------------------------------------------------
// End to end over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_cart_checkout_against_mongodb() {
    let app = ServerBuilder::new().with_stores(mongo_stores().await).build();
    let server = TestServer::try_new(app).unwrap();
    let admin = uuid::Uuid::new_v4().to_string();
    let user = uuid::Uuid::new_v4().to_string();

    let mut book_ids = Vec::new();
    for (title, price) in [("Dune", 100), ("Maus", 250)] {
        let book: Value = server
            .post("/books")
            .add_header("x-user-id", admin.as_str())
            .add_header("x-user-role", "admin")
            .json(&json!({ "title": title, "author": "A", "price": price, "category": "fiction" }))
            .await
            .json();
        book_ids.push(book["id"].as_str().unwrap().to_string());
    }

    let address: Value = server
        .post("/addresses")
        .add_header("x-user-id", user.as_str())
        .json(&json!({
            "name": "Asha", "street": "12 MG Road", "city": "Pune",
            "pincode": "411001", "phone": "9999999999"
        }))
        .await
        .json();

    for (product, quantity) in [(&book_ids[0], 2), (&book_ids[1], 1)] {
        server
            .post("/cart")
            .add_header("x-user-id", user.as_str())
            .json(&json!({ "productId": product, "quantity": quantity }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    let order: Value = server
        .post("/orders/cart")
        .add_header("x-user-id", user.as_str())
        .json(&json!({ "addressId": address["id"] }))
        .await
        .json();
    assert_eq!(order["totalAmount"], 450.0);
    assert_eq!(order["status"], "pending");

    let cart: Value = server
        .get("/cart")
        .add_header("x-user-id", user.as_str())
        .await
        .json();
    assert_eq!(cart, json!([]));
}
