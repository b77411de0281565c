use {
    super::Repository,
    crate::{
        api::RestError,
        user::entities,
    },
};

impl Repository {
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<entities::User>, RestError> {
        self.db.get_user_by_token(token).await
    }
}
