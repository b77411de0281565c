use {
    super::service::get_user::GetUserInput,
    crate::{
        api::RestError,
        kernel::entities::Address,
        state::Store,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        routing::get,
        Json,
        Router,
    },
    energy_market_api_types::{
        user::User,
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Look up a registered user by address.
#[utoipa::path(get, path = "/v1/users/{address}",
    params(("address" = String, Path, description = "Address of the user")),
    responses(
        (status = 200, body = User),
        (status = 404, description = "User was not found", body = ErrorBodyResponse),
    ),
)]
pub async fn get_user(
    State(store): State<Arc<Store>>,
    Path(address): Path<String>,
) -> Result<Json<User>, RestError> {
    let user = store
        .user_service
        .get_user(GetUserInput {
            address: Address::new(&address),
        })
        .await?
        .ok_or(RestError::UserNotFoundByAddress)?;
    Ok(Json(user.into()))
}

pub fn get_routes() -> Router<Arc<Store>> {
    Router::new().route("/:address", get(get_user))
}
