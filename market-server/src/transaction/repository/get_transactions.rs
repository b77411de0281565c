use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::Address,
        transaction::entities,
    },
};

impl Repository {
    pub async fn get_transactions(
        &self,
        address: Option<Address>,
    ) -> Result<Vec<entities::Transaction>, RestError> {
        self.db.get_transactions(address).await
    }
}
