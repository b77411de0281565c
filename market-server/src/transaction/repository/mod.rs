mod add_transaction;
mod get_transaction_by_hash;
mod get_transactions;
mod models;

pub use models::*;

pub const TRANSACTION_PAGE_SIZE_CAP: i64 = 100;

#[derive(Debug)]
pub struct Repository {
    pub db: Box<dyn Database>,
}

impl Repository {
    pub fn new(db: impl Database) -> Self {
        Self { db: Box::new(db) }
    }
}
