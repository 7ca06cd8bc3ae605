//! Request commands accepted at the HTTP boundary
//!
//! Each operation takes an explicit command type listing exactly the fields it
//! permits. Coercion (price from a numeric string, category names in any case,
//! trimming) happens during deserialization and rules are checked with
//! [`validator::Validate`] before any store is touched.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::core::model::{Book, Category, OrderStatus};

// =============================================================================
// Catalog
// =============================================================================

/// Fields accepted when creating a book
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBook {
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 300, message = "title is required"))]
    pub title: String,

    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, max = 200, message = "author is required"))]
    pub author: String,

    #[serde(deserialize_with = "coerce::price")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,

    pub category: Category,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateBook {
    pub fn into_book(self) -> Book {
        let mut book = Book::new(self.title, self.author, self.price, self.category);
        book.description = self.description;
        book.image_url = self.image_url;
        book
    }
}

/// Partial update of a book; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookPatch {
    #[serde(default, deserialize_with = "coerce::optional_trimmed")]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_trimmed")]
    #[validate(length(min = 1, max = 200, message = "author must not be empty"))]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "coerce::optional_price")]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,

    #[serde(default)]
    pub category: Option<Category>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
    }

    /// Apply the present fields to `book` and bump its update timestamp
    pub fn apply(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(category) = self.category {
            book.category = category;
        }
        if let Some(description) = self.description {
            book.description = Some(description);
        }
        if let Some(image_url) = self.image_url {
            book.image_url = Some(image_url);
        }
        book.updated_at = chrono::Utc::now();
    }
}

/// Sort orders offered by the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSort {
    #[serde(alias = "lowToHigh")]
    PriceAsc,
    #[serde(alias = "highToLow")]
    PriceDesc,
}

/// Query string for `GET /books`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub category: Option<Category>,
    pub sort: Option<PriceSort>,
}

// =============================================================================
// Cart & favorites
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    #[serde(alias = "product")]
    pub product_id: Uuid,

    #[validate(range(min = 1, max = 1000, message = "quantity must be at least 1"))]
    pub quantity: Option<u32>,
}

impl AddToCart {
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavorite {
    #[serde(alias = "product")]
    pub product_id: Uuid,
}

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,

    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,

    #[serde(default)]
    pub state: String,

    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, message = "pincode is required"))]
    pub pincode: String,

    #[serde(deserialize_with = "coerce::trimmed")]
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSingleOrder {
    pub product_id: Uuid,

    #[validate(range(min = 1, max = 1000, message = "quantity must be at least 1"))]
    pub quantity: Option<u32>,

    pub address_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCartOrder {
    pub address_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

/// Boundary coercions shared by the command types
mod coerce {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    fn to_price<E: Error>(raw: NumberOrString) -> Result<f64, E> {
        let value = match raw {
            NumberOrString::Number(n) => n,
            NumberOrString::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("price '{}' is not a number", s)))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(E::custom("price must be a finite number"))
        }
    }

    pub fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        to_price(NumberOrString::deserialize(deserializer)?)
    }

    pub fn optional_price<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<NumberOrString>::deserialize(deserializer)?
            .map(to_price)
            .transpose()
    }

    pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(String::deserialize(deserializer)?.trim().to_string())
    }

    pub fn optional_trimmed<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
    }
}
