use {
    super::Repository,
    crate::{
        api::RestError,
        kernel::entities::Address,
        user::entities,
    },
};

impl Repository {
    pub async fn get_users(&self, addresses: &[Address]) -> Result<Vec<entities::User>, RestError> {
        if addresses.is_empty() {
            return Ok(vec![]);
        }
        self.db.get_users(addresses).await
    }
}
