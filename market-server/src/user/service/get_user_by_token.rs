use {
    super::Service,
    crate::{
        api::RestError,
        user::entities,
    },
};

pub struct GetUserByTokenInput {
    pub token: String,
}

impl Service {
    /// Resolves the caller behind a bearer token. Revoked and unknown tokens resolve to `None`.
    pub async fn get_user_by_token(
        &self,
        input: GetUserByTokenInput,
    ) -> Result<Option<entities::User>, RestError> {
        if input.token.is_empty() {
            return Ok(None);
        }
        self.repo.get_user_by_token(&input.token).await
    }
}
