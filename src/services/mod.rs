//! Business operations, one service per resource
//!
//! Services own the rules; handlers only extract identity and commands and
//! call into them. All services share the same [`Stores`].

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod favorites;
pub mod orders;

pub use addresses::AddressService;
pub use cart::{CartLine, CartService};
pub use catalog::CatalogService;
pub use dashboard::{CategoryCount, DashboardService, DashboardStats};
pub use favorites::{FavoriteService, FavoriteView};
pub use orders::{AddressRef, OrderLineView, OrderService, OrderView, ProductRef};

use crate::storage::Stores;

/// Every service, wired to one set of stores; this is the router state
#[derive(Clone)]
pub struct Services {
    pub catalog: CatalogService,
    pub cart: CartService,
    pub addresses: AddressService,
    pub orders: OrderService,
    pub favorites: FavoriteService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(stores: &Stores) -> Self {
        Self {
            catalog: CatalogService::new(stores),
            cart: CartService::new(stores),
            addresses: AddressService::new(stores),
            orders: OrderService::new(stores),
            favorites: FavoriteService::new(stores),
            dashboard: DashboardService::new(stores),
        }
    }
}
