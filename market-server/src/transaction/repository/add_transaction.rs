use {
    super::Repository,
    crate::{
        api::RestError,
        transaction::entities,
    },
};

impl Repository {
    pub async fn add_transaction(&self, transaction: &entities::Transaction) -> Result<(), RestError> {
        self.db.add_transaction(transaction).await
    }
}
