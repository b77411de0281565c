use {
    super::repository::{
        Database,
        Repository,
    },
    std::sync::Arc,
};

pub mod get_transaction_by_hash;
pub mod get_transactions;
pub mod record_transaction;

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct ServiceInner {
    repo: Repository,
}

impl Service {
    pub fn new(db: impl Database) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Repository::new(db),
        }))
    }
}
