//! Favorite service: per-user bookmarks on books

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{BookstoreError, ServiceResult};
use crate::core::model::{BookSummary, Favorite};
use crate::core::service::{CatalogStore, FavoriteStore};
use crate::storage::Stores;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteView {
    pub id: Uuid,
    pub product: Option<BookSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct FavoriteService {
    catalog: Arc<dyn CatalogStore>,
    favorites: Arc<dyn FavoriteStore>,
}

impl FavoriteService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            catalog: stores.catalog.clone(),
            favorites: stores.favorites.clone(),
        }
    }

    /// Bookmark a book; a second bookmark on the same book is a conflict
    pub async fn add_favorite(&self, user: Uuid, product: Uuid) -> ServiceResult<Favorite> {
        self.catalog
            .find_by_id(&product)
            .await
            .map_err(BookstoreError::storage)?
            .ok_or_else(|| BookstoreError::not_found("product", product))?;

        let existing = self
            .favorites
            .find(&user, &product)
            .await
            .map_err(BookstoreError::storage)?;
        if existing.is_some() {
            return Err(BookstoreError::Conflict(
                "Book is already in favorites".to_string(),
            ));
        }

        self.favorites
            .insert(Favorite::new(user, product))
            .await
            .map_err(BookstoreError::storage)
    }

    /// Favorites of `user`, newest first
    pub async fn list_favorites(&self, user: Uuid) -> ServiceResult<Vec<FavoriteView>> {
        let favorites = self
            .favorites
            .list_by_user(&user)
            .await
            .map_err(BookstoreError::storage)?;

        let mut views = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            let product = self
                .catalog
                .find_by_id(&favorite.product)
                .await
                .map_err(BookstoreError::storage)?
                .map(|book| book.summary());
            views.push(FavoriteView {
                id: favorite.id,
                product,
                created_at: favorite.created_at,
            });
        }
        Ok(views)
    }

    pub async fn remove_favorite(&self, user: Uuid, product: Uuid) -> ServiceResult<()> {
        let removed = self
            .favorites
            .delete(&user, &product)
            .await
            .map_err(BookstoreError::storage)?;
        if !removed {
            return Err(BookstoreError::not_found("favorite", product));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Book, Category};

    #[tokio::test]
    async fn test_favorite_lifecycle() {
        let stores = Stores::in_memory();
        let service = FavoriteService::new(&stores);
        let user = Uuid::new_v4();
        let book = stores
            .catalog
            .insert(Book::new("Matilda", "Roald Dahl", 8.0, Category::Children))
            .await
            .unwrap();

        service.add_favorite(user, book.id).await.unwrap();
        let duplicate = service.add_favorite(user, book.id).await.unwrap_err();
        assert!(matches!(duplicate, BookstoreError::Conflict(_)));

        let listed = service.list_favorites(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product.as_ref().unwrap().title, "Matilda");

        service.remove_favorite(user, book.id).await.unwrap();
        assert!(matches!(
            service.remove_favorite(user, book.id).await,
            Err(BookstoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_book_cannot_be_favorited() {
        let service = FavoriteService::new(&Stores::in_memory());
        let err = service
            .add_favorite(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, BookstoreError::NotFound(_)));
    }
}
