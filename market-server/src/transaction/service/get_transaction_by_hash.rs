use {
    super::Service,
    crate::{
        api::RestError,
        transaction::entities,
    },
};

pub struct GetTransactionByHashInput {
    pub transaction_hash: String,
}

impl Service {
    pub async fn get_transaction_by_hash(
        &self,
        input: GetTransactionByHashInput,
    ) -> Result<entities::Transaction, RestError> {
        self.repo
            .get_transaction_by_hash(&input.transaction_hash)
            .await?
            .ok_or(RestError::TransactionNotFound)
    }
}
