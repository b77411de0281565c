use {
    super::entities,
    std::collections::HashMap,
    tokio::sync::Mutex,
};

mod activate_auction;
mod add_auction;
mod append_bid;
mod conclude_auction;
mod fail_auction;
mod get_active_auctions;
mod get_auction;
mod get_concluded_auctions;
mod get_expired_auctions;
mod get_or_create_in_memory_auction_lock;
mod get_stale_pending_auctions;
#[cfg(test)]
mod in_memory_db;
mod models;
mod remove_in_memory_auction_lock;

#[cfg(test)]
pub use in_memory_db::InMemoryDatabase;
pub use models::*;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub auction_lock: Mutex<HashMap<entities::AuctionId, entities::AuctionLock>>,
}

#[derive(Debug)]
pub struct Repository {
    pub in_memory_store: InMemoryStore,
    pub db:              Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self {
            in_memory_store: InMemoryStore::default(),
            db:              Box::new(db),
        }
    }
}
