//! Address service: a user's delivery addresses

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::commands::NewAddress;
use crate::core::error::{BookstoreError, ServiceResult};
use crate::core::model::Address;
use crate::core::service::AddressStore;
use crate::storage::Stores;

#[derive(Clone)]
pub struct AddressService {
    addresses: Arc<dyn AddressStore>,
}

impl AddressService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            addresses: stores.addresses.clone(),
        }
    }

    pub async fn add_address(&self, user: Uuid, cmd: NewAddress) -> ServiceResult<Address> {
        cmd.validate()?;
        let address = Address {
            id: Uuid::new_v4(),
            user,
            name: cmd.name,
            street: cmd.street,
            city: cmd.city,
            state: cmd.state.trim().to_string(),
            pincode: cmd.pincode,
            phone: cmd.phone,
            created_at: Utc::now(),
        };
        let address = self
            .addresses
            .insert(address)
            .await
            .map_err(BookstoreError::storage)?;
        tracing::info!(address_id = %address.id, user_id = %user, "address added");
        Ok(address)
    }

    /// Addresses of `user` in the order they were added
    pub async fn list_addresses(&self, user: Uuid) -> ServiceResult<Vec<Address>> {
        self.addresses
            .list_by_user(&user)
            .await
            .map_err(BookstoreError::storage)
    }

    /// One address, visible only to its owner
    pub async fn get_address(&self, user: Uuid, id: Uuid) -> ServiceResult<Address> {
        self.addresses
            .find_by_id(&id)
            .await
            .map_err(BookstoreError::storage)?
            .filter(|address| address.user == user)
            .ok_or_else(|| BookstoreError::not_found("address", id))
    }

    /// The most recently added address, used to preselect checkout
    pub async fn default_address(&self, user: Uuid) -> ServiceResult<Option<Address>> {
        Ok(self.list_addresses(user).await?.pop())
    }
}
