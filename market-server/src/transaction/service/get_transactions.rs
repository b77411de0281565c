use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::Address,
        transaction::entities,
    },
};

pub struct GetTransactionsInput {
    pub address: Option<Address>,
}

impl Service {
    pub async fn get_transactions(
        &self,
        input: GetTransactionsInput,
    ) -> Result<Vec<entities::Transaction>, RestError> {
        self.repo.get_transactions(input.address).await
    }
}
