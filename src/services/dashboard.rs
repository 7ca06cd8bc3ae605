//! Admin dashboard statistics

use serde::Serialize;
use std::sync::Arc;

use crate::core::error::{BookstoreError, ServiceResult};
use crate::core::model::Category;
use crate::core::service::CatalogStore;
use crate::storage::Stores;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub name: Category,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: u64,
    pub avg_price: f64,
    /// Busiest category first; ties broken by category name
    pub categories: Vec<CategoryCount>,
    pub top_category: Option<CategoryCount>,
}

#[derive(Clone)]
pub struct DashboardService {
    catalog: Arc<dyn CatalogStore>,
}

impl DashboardService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            catalog: stores.catalog.clone(),
        }
    }

    pub async fn stats(&self) -> ServiceResult<DashboardStats> {
        let summary = self.catalog.summary().await.map_err(BookstoreError::storage)?;

        let mut categories: Vec<CategoryCount> = summary
            .per_category
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(name, count)| CategoryCount { name, count })
            .collect();
        categories.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.name.as_str().cmp(b.name.as_str()))
        });

        Ok(DashboardStats {
            total_books: summary.total_books,
            avg_price: summary.average_price,
            top_category: categories.first().cloned(),
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Book;

    #[tokio::test]
    async fn test_empty_catalog() {
        let stats = DashboardService::new(&Stores::in_memory()).stats().await.unwrap();
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.avg_price, 0.0);
        assert!(stats.categories.is_empty());
        assert!(stats.top_category.is_none());
    }

    #[tokio::test]
    async fn test_counts_and_tie_break() {
        let stores = Stores::in_memory();
        for (price, category) in [
            (10.0, Category::Fiction),
            (20.0, Category::Comics),
            (30.0, Category::Fiction),
            (40.0, Category::Comics),
            (50.0, Category::Children),
        ] {
            stores
                .catalog
                .insert(Book::new("t", "a", price, category))
                .await
                .unwrap();
        }

        let stats = DashboardService::new(&stores).stats().await.unwrap();
        assert_eq!(stats.total_books, 5);
        assert_eq!(stats.avg_price, 30.0);

        let order: Vec<_> = stats.categories.iter().map(|c| (c.name, c.count)).collect();
        assert_eq!(
            order,
            [(Category::Comics, 2), (Category::Fiction, 2), (Category::Children, 1)]
        );
        assert_eq!(stats.top_category.unwrap().name, Category::Comics);

        let json = serde_json::to_value(DashboardService::new(&stores).stats().await.unwrap()).unwrap();
        assert_eq!(json["totalBooks"], 5);
        assert_eq!(json["topCategory"]["name"], "comics");
    }

    #[tokio::test]
    async fn test_average_price_is_the_exact_mean() {
        let stores = Stores::in_memory();
        for price in [10.0, 10.0, 15.0] {
            stores
                .catalog
                .insert(Book::new("t", "a", price, Category::Fiction))
                .await
                .unwrap();
        }

        let stats = DashboardService::new(&stores).stats().await.unwrap();
        assert!((stats.avg_price - 35.0 / 3.0).abs() < 1e-9);
        assert_ne!(stats.avg_price, 11.67);
    }
}
