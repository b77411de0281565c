#[cfg(test)]
use mockall::automock;
use {
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::Address,
        },
        user::entities,
    },
    axum::async_trait,
    sqlx::FromRow,
    std::fmt::Debug,
    time::PrimitiveDateTime,
    tracing::instrument,
};

#[derive(Clone, FromRow, Debug)]
pub struct User {
    pub address:       String,
    pub name:          String,
    pub city:          Option<String>,
    pub latitude:      f64,
    pub longitude:     f64,
    pub is_producer:   bool,
    pub reputation:    i32,
    pub creation_time: PrimitiveDateTime,
}

impl From<User> for entities::User {
    fn from(user: User) -> Self {
        Self {
            address:       Address::new(&user.address),
            name:          user.name,
            city:          user.city,
            latitude:      user.latitude,
            longitude:     user.longitude,
            is_producer:   user.is_producer,
            reputation:    user.reputation,
            creation_time: user.creation_time.assume_utc(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn get_user(&self, address: &Address) -> Result<Option<entities::User>, RestError>;
    async fn get_users(&self, addresses: &[Address]) -> Result<Vec<entities::User>, RestError>;
    /// The user an unrevoked access token was issued to.
    async fn get_user_by_token(&self, token: &str) -> Result<Option<entities::User>, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_get_user",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_user",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_user(&self, address: &Address) -> Result<Option<entities::User>, RestError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE address = $1")
            .bind(address.as_str())
            .fetch_optional(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), address = %address, "DB: Failed to get user");
                RestError::TemporarilyUnavailable
            })?;
        Ok(user.map(Into::into))
    }

    #[instrument(
        target = "metrics",
        name = "db_get_users",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_users",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_users(&self, addresses: &[Address]) -> Result<Vec<entities::User>, RestError> {
        let addresses: Vec<String> = addresses.iter().map(Address::to_string).collect();
        let users: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE address = ANY($1)")
            .bind(addresses)
            .fetch_all(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), "DB: Failed to get users");
                RestError::TemporarilyUnavailable
            })?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_user_by_token",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_user_by_token",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_user_by_token(&self, token: &str) -> Result<Option<entities::User>, RestError> {
        let user: Option<User> = sqlx::query_as(
            "SELECT users.* FROM access_token JOIN users ON users.address = access_token.address WHERE access_token.token = $1 AND access_token.revoked_at IS NULL",
        )
        .bind(token)
        .fetch_optional(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to get user by access token");
            RestError::TemporarilyUnavailable
        })?;
        Ok(user.map(Into::into))
    }
}
