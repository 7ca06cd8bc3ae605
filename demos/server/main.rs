//! Bookstore API server
//!
//! Loads configuration (optional YAML path as the first argument, then
//! `BOOKSTORE_*` environment overrides), picks the storage backend and serves
//! the REST API until Ctrl+C or SIGTERM.
//!
//! ```text
//! cargo run --example bookstore_server
//! cargo run --example bookstore_server --features mongodb_backend -- bookstore.yaml
//! ```

use anyhow::Result;
use bookstore::config::StorageConfig;
use bookstore::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1);
    let config = AppConfig::load(path.as_deref())?;
    bookstore::init_tracing(&config.log);

    let stores = open_stores(&config.storage).await?;
    if matches!(config.storage, StorageConfig::InMemory) {
        seed_catalog(&stores).await?;
    }

    println!("\n🌐 Bookstore API on http://{}", config.bind_addr());
    println!("\n  📚 Catalog:   GET /books, GET /books/{{id}}, POST|PUT|DELETE (admin)");
    println!("  🛒 Cart:      GET|POST|DELETE /cart, DELETE /cart/{{id}}");
    println!("  🏠 Addresses: GET /addresses/my, POST /addresses, GET /addresses/{{id}}");
    println!("  ⭐ Favorites: GET|POST /favorites, DELETE /favorites/{{product_id}}");
    println!("  📦 Orders:    POST /orders/single, POST /orders/cart, GET /orders/my");
    println!("               PATCH|POST|DELETE /orders/cancel/{{id}}");
    println!("               GET /orders, PATCH /orders/{{id}}/status (admin)");
    println!("  📊 Stats:     GET /dashboard/stats");
    println!("\n  Identify with `x-user-id: <uuid>` and `x-user-role: admin`.\n");

    ServerBuilder::new()
        .with_stores(stores)
        .with_cors(config.server.cors_allow_any)
        .serve(&config.bind_addr())
        .await
}

async fn open_stores(storage: &StorageConfig) -> Result<Stores> {
    match storage {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory stores");
            Ok(Stores::in_memory())
        }
        #[cfg(feature = "mongodb_backend")]
        StorageConfig::Mongo { uri, database } => {
            let client = mongodb::Client::with_uri_str(uri).await?;
            let database = client.database(database);
            bookstore::storage::mongodb::ensure_indexes(&database).await?;
            tracing::info!(database = %database.name(), "using MongoDB stores");
            Ok(Stores::mongo(&database))
        }
        #[cfg(not(feature = "mongodb_backend"))]
        StorageConfig::Mongo { .. } => {
            anyhow::bail!("MongoDB storage requires the `mongodb_backend` feature")
        }
    }
}

async fn seed_catalog(stores: &Stores) -> Result<()> {
    let books = [
        Book::new("Dune", "Frank Herbert", 399.0, Category::Fiction)
            .with_description("Desert planet, spice and prophecy."),
        Book::new("Sapiens", "Yuval Noah Harari", 499.0, Category::NonFiction),
        Book::new("The Gruffalo", "Julia Donaldson", 250.0, Category::Children),
        Book::new("Maus", "Art Spiegelman", 650.0, Category::Comics),
    ];
    for book in books {
        stores.catalog.insert(book).await?;
    }
    tracing::info!("seeded demo catalog");
    Ok(())
}
