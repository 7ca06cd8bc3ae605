//! Catalog service: book CRUD and storefront listing

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::commands::{BookPatch, BookQuery, CreateBook, PriceSort};
use crate::core::error::{BookstoreError, ServiceResult};
use crate::core::model::Book;
use crate::core::service::CatalogStore;
use crate::storage::Stores;

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            books: stores.catalog.clone(),
        }
    }

    pub async fn create_book(&self, cmd: CreateBook) -> ServiceResult<Book> {
        cmd.validate()?;
        let book = self
            .books
            .insert(cmd.into_book())
            .await
            .map_err(BookstoreError::storage)?;
        tracing::info!(book_id = %book.id, title = %book.title, "book created");
        Ok(book)
    }

    /// Books filtered by category and ordered by price when asked;
    /// newest first otherwise
    pub async fn list_books(&self, query: BookQuery) -> ServiceResult<Vec<Book>> {
        let mut books = self.books.list().await.map_err(BookstoreError::storage)?;

        if let Some(category) = query.category {
            books.retain(|book| book.category == category);
        }

        match query.sort {
            Some(PriceSort::PriceAsc) => books.sort_by(|a, b| a.price.total_cmp(&b.price)),
            Some(PriceSort::PriceDesc) => books.sort_by(|a, b| b.price.total_cmp(&a.price)),
            None => books.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        Ok(books)
    }

    pub async fn get_book(&self, id: Uuid) -> ServiceResult<Book> {
        self.books
            .find_by_id(&id)
            .await
            .map_err(BookstoreError::storage)?
            .ok_or_else(|| BookstoreError::not_found("book", id))
    }

    /// Apply a partial update; only the fields present in `patch` change
    pub async fn update_book(&self, id: Uuid, patch: BookPatch) -> ServiceResult<Book> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(BookstoreError::invalid_input("No fields to update"));
        }

        let mut book = self.get_book(id).await?;
        patch.apply(&mut book);

        let book = self
            .books
            .replace(book)
            .await
            .map_err(BookstoreError::storage)?
            .ok_or_else(|| BookstoreError::not_found("book", id))?;
        tracing::info!(book_id = %id, "book updated");
        Ok(book)
    }

    /// Remove a book. Placed orders keep their snapshot of it.
    pub async fn delete_book(&self, id: Uuid) -> ServiceResult<()> {
        let removed = self.books.delete(&id).await.map_err(BookstoreError::storage)?;
        if !removed {
            return Err(BookstoreError::not_found("book", id));
        }
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Category;

    async fn seeded() -> CatalogService {
        let service = CatalogService::new(&Stores::in_memory());
        for (title, price, category) in [
            ("Dune", 300.0, Category::Fiction),
            ("Sapiens", 450.0, Category::NonFiction),
            ("Gruffalo", 120.0, Category::Children),
            ("Foundation", 200.0, Category::Fiction),
        ] {
            service
                .create_book(CreateBook {
                    title: title.to_string(),
                    author: "Someone".to_string(),
                    price,
                    category,
                    description: None,
                    image_url: None,
                })
                .await
                .unwrap();
        }
        service
    }

    #[tokio::test]
    async fn test_filter_and_sort() {
        let service = seeded().await;

        let fiction = service
            .list_books(BookQuery {
                category: Some(Category::Fiction),
                sort: Some(PriceSort::PriceAsc),
            })
            .await
            .unwrap();
        let titles: Vec<_> = fiction.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Foundation", "Dune"]);

        let all = service
            .list_books(BookQuery {
                category: None,
                sort: Some(PriceSort::PriceDesc),
            })
            .await
            .unwrap();
        assert_eq!(all.first().unwrap().title, "Sapiens");
        assert_eq!(all.last().unwrap().title, "Gruffalo");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = seeded().await;
        let book = service.list_books(BookQuery::default()).await.unwrap().remove(0);

        let updated = service
            .update_book(
                book.id,
                BookPatch {
                    price: Some(99.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 99.0);
        assert_eq!(updated.title, book.title);

        let empty = service.update_book(book.id, BookPatch::default()).await.unwrap_err();
        assert!(matches!(empty, BookstoreError::InvalidInput(_)));

        service.delete_book(book.id).await.unwrap();
        let gone = service.get_book(book.id).await.unwrap_err();
        assert!(matches!(gone, BookstoreError::NotFound(_)));
        assert!(matches!(
            service.delete_book(book.id).await,
            Err(BookstoreError::NotFound(_))
        ));
    }
}
