//! Domain records persisted by the stores
//!
//! All records serialize with camelCase field names, which is the shape the
//! single-page frontend consumes. Identifiers are UUIDs and timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// Catalog
// =============================================================================

/// Book category, drawn from the fixed set the storefront filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Fiction,
    NonFiction,
    Children,
    Comics,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Fiction,
        Category::NonFiction,
        Category::Children,
        Category::Comics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fiction => "fiction",
            Category::NonFiction => "non-fiction",
            Category::Children => "children",
            Category::Comics => "comics",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive; "Non-Fiction", "non fiction" and "nonfiction" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "fiction" => Ok(Category::Fiction),
            "nonfiction" => Ok(Category::NonFiction),
            "children" => Ok(Category::Children),
            "comics" => Ok(Category::Comics),
            _ => Err(format!(
                "unknown category '{}', expected one of: fiction, non-fiction, children, comics",
                s
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A purchasable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        price: f64,
        category: Category,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author: author.into(),
            price,
            category,
            description: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Display fields resolved into cart, favorite and order views
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category,
            price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}

/// Read-time projection of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: Category,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// One (user, product) line in a user's cart; unique per pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user: Uuid,
    pub product: Uuid,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(user: Uuid, product: Uuid, quantity: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user,
            product,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Address
// =============================================================================

/// A delivery address owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user: Uuid,
    pub name: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub pincode: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// Lifecycle status of an order
///
/// `pending → confirmed → shipped → delivered`, with `cancelled` as the only
/// other exit from `pending`. `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Status every new order starts in
    pub const INITIAL: OrderStatus = OrderStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether the lifecycle has an edge from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

/// Supported payment methods; cash on delivery only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
}

/// A line item captured when the order was placed
///
/// Name, image and price are copies; later catalog edits or deletions never
/// reach an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price: f64,
    pub quantity: u32,
}

impl OrderLine {
    pub fn snapshot(book: &Book, quantity: u32) -> Self {
        Self {
            product: book.id,
            name: book.title.clone(),
            image_url: book.image_url.clone(),
            price: book.price,
            quantity,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// A placed order; immutable apart from its status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user: Uuid,
    pub products: Vec<OrderLine>,
    pub address: Uuid,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order in the initial status; the total is fixed here
    pub fn place(user: Uuid, address: Uuid, products: Vec<OrderLine>) -> Self {
        let now = Utc::now();
        let total_amount = products.iter().map(OrderLine::subtotal).sum();
        Self {
            id: Uuid::new_v4(),
            user,
            products,
            address,
            total_amount,
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::INITIAL,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Favorites
// =============================================================================

/// A user's bookmark on a book; unique per (user, product)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user: Uuid,
    pub product: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(user: Uuid, product: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            product,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!("Fiction".parse::<Category>().unwrap(), Category::Fiction);
        assert_eq!("Non-Fiction".parse::<Category>().unwrap(), Category::NonFiction);
        assert_eq!("non fiction".parse::<Category>().unwrap(), Category::NonFiction);
        assert_eq!(" COMICS ".parse::<Category>().unwrap(), Category::Comics);
        assert!("poetry".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        let json = serde_json::to_value(Category::NonFiction).unwrap();
        assert_eq!(json, "non-fiction");
        let back: Category = serde_json::from_value(serde_json::json!("Children")).unwrap();
        assert_eq!(back, Category::Children);
    }

    #[test]
    fn test_lifecycle_edges() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Confirmed.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Confirmed));
        for next in [Pending, Confirmed, Shipped, Delivered, Cancelled] {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Delivered.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn test_order_total_is_sum_of_lines() {
        let a = Book::new("Dune", "Frank Herbert", 100.0, Category::Fiction);
        let b = Book::new("Maus", "Art Spiegelman", 250.0, Category::Comics);
        let order = Order::place(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![OrderLine::snapshot(&a, 2), OrderLine::snapshot(&b, 1)],
        );

        assert_eq!(order.total_amount, 450.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_order_wire_format() {
        let book = Book::new("Dune", "Frank Herbert", 12.5, Category::Fiction)
            .with_image_url("https://img.example/dune.jpg");
        let order = Order::place(Uuid::new_v4(), Uuid::new_v4(), vec![OrderLine::snapshot(&book, 3)]);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["totalAmount"], 37.5);
        assert_eq!(json["paymentMethod"], "COD");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["products"][0]["name"], "Dune");
        assert_eq!(json["products"][0]["imageUrl"], "https://img.example/dune.jpg");
        assert_eq!(json["products"][0]["quantity"], 3);
    }
}
