use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::Address,
        user::entities,
    },
};

pub struct GetUserInput {
    pub address: Address,
}

impl Service {
    pub async fn get_user(&self, input: GetUserInput) -> Result<Option<entities::User>, RestError> {
        self.repo.get_user(&input.address).await
    }
}
