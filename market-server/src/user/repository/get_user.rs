use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::Address,
        user::entities,
    },
};

impl Repository {
    pub async fn get_user(&self, address: &Address) -> Result<Option<entities::User>, RestError> {
        self.db.get_user(address).await
    }
}
