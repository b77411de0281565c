use {
    super::Repository,
    crate::{
        api::RestError,
        transaction::entities,
    },
};

impl Repository {
    pub async fn get_transaction_by_hash(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<entities::Transaction>, RestError> {
        self.db.get_transaction_by_hash(transaction_hash).await
    }
}
