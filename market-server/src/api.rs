use {
    crate::{
        auction::{
            self,
            entities::AuctionStatus,
        },
        config::RunOptions,
        kernel::entities::Address,
        state::Store,
        transaction,
        user::{
            self,
            service::get_user_by_token::GetUserByTokenInput,
        },
    },
    anyhow::Result,
    axum::{
        async_trait,
        extract::FromRequestParts,
        http::{
            request::Parts,
            StatusCode,
        },
        response::{
            IntoResponse,
            Response,
        },
        routing::get,
        Json,
        Router,
    },
    axum_extra::{
        headers::{
            authorization::Bearer,
            Authorization,
        },
        TypedHeader,
    },
    axum_prometheus::PrometheusMetricLayerBuilder,
    energy_market_api_types::{
        auction::{
            Auction,
            AuctionComplete,
            AuctionCompleteResult,
            AuctionCreate,
            AuctionCreateResult,
            AuctionStatus as ApiAuctionStatus,
            Bid,
            BidCreate,
            BidResult,
            CompletionMethod,
        },
        transaction::{
            Transaction,
            TransactionStatus,
            TransactionType,
        },
        user::User,
        ErrorBodyResponse,
    },
    std::sync::Arc,
    tokio_util::sync::CancellationToken,
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

async fn root() -> String {
    format!("Energy Market Server API {}", crate::VERSION)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestError {
    /// The request contained invalid parameters
    BadParameters(String),
    /// The request carried no access token
    Unauthorized,
    /// The access token is unknown or revoked
    InvalidToken,
    /// The acting address is not a registered user
    UserNotFound,
    /// The acting user is not allowed to perform the operation
    Forbidden(String),
    /// The auction was not found
    AuctionNotFound,
    /// The transaction was not found
    TransactionNotFound,
    /// No user is registered under the requested address
    UserNotFoundByAddress,
    /// The auction is not accepting the operation in its current status
    AuctionNotActive(AuctionStatus),
    /// A stored auction violates an invariant
    InconsistentAuction(String),
    /// The chain did not accept the submission
    ChainSubmissionFailed {
        reason:  String,
        auction: Option<Box<Auction>>,
    },
    /// Internal error occurred during processing the request
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            RestError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid access token".to_string(),
            ),
            RestError::UserNotFound => (StatusCode::BAD_REQUEST, "User not found".to_string()),
            RestError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            RestError::AuctionNotFound => (
                StatusCode::NOT_FOUND,
                "Auction with the specified id was not found".to_string(),
            ),
            RestError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "Transaction with the specified hash was not found".to_string(),
            ),
            RestError::UserNotFoundByAddress => (
                StatusCode::NOT_FOUND,
                "User with the specified address was not found".to_string(),
            ),
            RestError::AuctionNotActive(status) => (
                StatusCode::BAD_REQUEST,
                format!("Auction is not active (status: {})", status),
            ),
            RestError::InconsistentAuction(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Inconsistent auction record: {}", msg),
            ),
            RestError::ChainSubmissionFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Chain submission failed".to_string(),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }

    /// The detail behind the message, or the kind of failure for errors without one.
    pub fn cause(&self) -> String {
        match self {
            RestError::BadParameters(msg)
            | RestError::Forbidden(msg)
            | RestError::InconsistentAuction(msg) => msg.clone(),
            RestError::ChainSubmissionFailed { reason, .. } => reason.clone(),
            RestError::AuctionNotActive(status) => format!("status: {}", status),
            RestError::Unauthorized => "missing_token".to_string(),
            RestError::InvalidToken => "invalid_token".to_string(),
            RestError::UserNotFound => "user_not_found".to_string(),
            RestError::AuctionNotFound => "auction_not_found".to_string(),
            RestError::TransactionNotFound => "transaction_not_found".to_string(),
            RestError::UserNotFoundByAddress => "user_not_found".to_string(),
            RestError::TemporarilyUnavailable => "temporarily_unavailable".to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, message) = self.to_status_and_message();
        let error = self.cause();
        let auction = match self {
            RestError::ChainSubmissionFailed { auction, .. } => auction.map(|auction| *auction),
            _ => None,
        };
        (
            status,
            Json(ErrorBodyResponse {
                message,
                error,
                auction,
            }),
        )
            .into_response()
    }
}

/// The caller of a request, resolved from its bearer token.
#[derive(Debug, Clone)]
pub enum Auth {
    Authorized(user::entities::User),
    Unauthorized,
}

impl Auth {
    pub async fn from_token(
        user_service: &user::service::Service,
        token: Option<String>,
    ) -> Result<Self, RestError> {
        let Some(token) = token else {
            return Ok(Auth::Unauthorized);
        };
        match user_service
            .get_user_by_token(GetUserByTokenInput { token })
            .await?
        {
            Some(user) => Ok(Auth::Authorized(user)),
            None => Err(RestError::InvalidToken),
        }
    }

    /// The address a mutating request acts as.
    ///
    /// An address named in the request body must match the authenticated user.
    pub fn acting_address(&self, claimed: Option<String>) -> Result<Address, RestError> {
        let user = match self {
            Auth::Authorized(user) => user,
            Auth::Unauthorized => return Err(RestError::Unauthorized),
        };
        match claimed.map(Address::from) {
            Some(claimed) if !claimed.is_empty() && claimed != user.address => Err(
                RestError::Forbidden("Cannot act on behalf of another address".to_string()),
            ),
            _ => Ok(user.address.clone()),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<Store>> for Auth {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        store: &Arc<Store>,
    ) -> Result<Self, Self::Rejection> {
        let token = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, store)
            .await
            .ok()
            .map(|TypedHeader(authorization)| authorization.token().to_string());
        Auth::from_token(&store.user_service, token).await
    }
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

// Make sure functions included in the paths section have distinct names, otherwise some api generators will fail
#[derive(OpenApi)]
#[openapi(
    paths(
        auction::api::post_auction,
        auction::api::post_bid,
        auction::api::complete_auction,
        auction::api::get_active_auctions,
        auction::api::get_completed_auctions,
        auction::api::get_auction,
        transaction::api::get_transactions,
        transaction::api::get_transaction,
        user::api::get_user,
    ),
    components(
        schemas(
            Auction,
            AuctionComplete,
            AuctionCompleteResult,
            AuctionCreate,
            AuctionCreateResult,
            ApiAuctionStatus,
            Bid,
            BidCreate,
            BidResult,
            CompletionMethod,
            Transaction,
            TransactionStatus,
            TransactionType,
            User,
            ErrorBodyResponse,
        ),
        responses(ErrorBodyResponse, Auction, AuctionCreateResult, BidResult, Transaction, User),
    ),
    tags(
        (name = "Energy Market Server", description = "Energy Market Server runs reverse auctions between energy consumers and producers \
        and settles their outcome on chain.")
    )
)]
pub struct ApiDoc;

pub fn router(store: Arc<Store>) -> Router {
    let v1_routes = Router::new().nest(
        "/v1",
        Router::new()
            .nest("/auctions", auction::api::get_routes())
            .nest("/transactions", transaction::api::get_routes())
            .nest("/users", user::api::get_routes()),
    );

    Router::new()
        .merge(Redoc::with_url("/docs", ApiDoc::openapi()))
        .route("/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(v1_routes)
        .route("/", get(root))
        .route("/live", get(live))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub async fn start_api(
    run_options: RunOptions,
    store: Arc<Store>,
    shutdown: CancellationToken,
) -> Result<()> {
    let (metric_layer, _) = PrometheusMetricLayerBuilder::new()
        .with_metrics_from_fn(|| store.metrics_recorder.clone())
        .build_pair();
    let app = router(store.clone()).layer(metric_layer);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    tracing::info!(addr = %run_options.server.listen_addr, "Listening for API requests");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("Shutting down RPC server...");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::user::entities::tests::make_user,
        axum::body::to_bytes,
    };

    #[test]
    fn test_error_statuses() {
        let cases = [
            (RestError::BadParameters("x".to_string()), StatusCode::BAD_REQUEST),
            (RestError::Unauthorized, StatusCode::UNAUTHORIZED),
            (RestError::InvalidToken, StatusCode::UNAUTHORIZED),
            (RestError::UserNotFound, StatusCode::BAD_REQUEST),
            (RestError::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
            (RestError::AuctionNotFound, StatusCode::NOT_FOUND),
            (RestError::TransactionNotFound, StatusCode::NOT_FOUND),
            (RestError::UserNotFoundByAddress, StatusCode::NOT_FOUND),
            (
                RestError::AuctionNotActive(AuctionStatus::Completed),
                StatusCode::BAD_REQUEST,
            ),
            (
                RestError::InconsistentAuction("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RestError::ChainSubmissionFailed {
                    reason:  "x".to_string(),
                    auction: None,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (RestError::TemporarilyUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(error.to_status_and_message().0, status, "{:?}", error);
        }
    }

    #[test]
    fn test_auction_not_active_message_names_status() {
        let (_, message) = RestError::AuctionNotActive(AuctionStatus::Expired).to_status_and_message();
        assert_eq!(message, "Auction is not active (status: expired)");
    }

    #[tokio::test]
    async fn test_chain_failure_body_carries_cause() {
        let response = RestError::ChainSubmissionFailed {
            reason:  "execution reverted".to_string(),
            auction: None,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Chain submission failed");
        assert_eq!(body["error"], "execution reverted");
        assert!(body.get("auction").is_none());
    }

    fn token_lookup(token: &'static str, user: user::entities::User) -> user::service::Service {
        let mut db = user::repository::MockDatabase::new();
        db.expect_get_user_by_token().returning(move |presented| {
            Ok((presented == token).then(|| user.clone()))
        });
        user::service::Service::new(db)
    }

    #[tokio::test]
    async fn test_auth_resolves_token_to_user() {
        let alice = make_user("0xalice", "Alice", false);
        let user_service = token_lookup("secret", alice.clone());

        match Auth::from_token(&user_service, Some("secret".to_string())).await {
            Ok(Auth::Authorized(user)) => assert_eq!(user, alice),
            other => panic!("unexpected auth: {:?}", other),
        }
        assert!(matches!(
            Auth::from_token(&user_service, None).await,
            Ok(Auth::Unauthorized)
        ));
        assert_eq!(
            Auth::from_token(&user_service, Some("stolen".to_string()))
                .await
                .unwrap_err(),
            RestError::InvalidToken
        );
    }

    #[test]
    fn test_acting_address_comes_from_token() {
        let auth = Auth::Authorized(make_user("0xalice", "Alice", false));
        assert_eq!(auth.acting_address(None).unwrap(), Address::new("0xalice"));
        assert_eq!(
            auth.acting_address(Some("0xALICE".to_string())).unwrap(),
            Address::new("0xalice")
        );
        assert_eq!(
            auth.acting_address(Some(String::new())).unwrap(),
            Address::new("0xalice")
        );
        assert!(matches!(
            auth.acting_address(Some("0xbob".to_string())),
            Err(RestError::Forbidden(_))
        ));
        assert_eq!(
            Auth::Unauthorized
                .acting_address(Some("0xalice".to_string()))
                .unwrap_err(),
            RestError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_every_error_body_carries_cause() {
        let response = RestError::BadParameters("amount must be positive".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Bad parameters: amount must be positive");
        assert_eq!(body["error"], "amount must be positive");

        let response = RestError::AuctionNotFound.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "auction_not_found");
        assert!(body.get("auction").is_none());
    }

    #[test]
    fn test_auction_not_active_cause_names_status() {
        assert_eq!(
            RestError::AuctionNotActive(AuctionStatus::Cancelled).cause(),
            "status: cancelled"
        );
    }
}
