use {
    super::service::{
        get_transaction_by_hash::GetTransactionByHashInput,
        get_transactions::GetTransactionsInput,
    },
    crate::{
        api::RestError,
        kernel::entities::Address,
        state::Store,
    },
    axum::{
        extract::{
            Path,
            Query,
            State,
        },
        routing::get,
        Json,
        Router,
    },
    energy_market_api_types::{
        transaction::{
            GetTransactionsQueryParams,
            Transaction,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// List the most recent ledger entries, optionally only those involving an address.
#[utoipa::path(get, path = "/v1/transactions", params(GetTransactionsQueryParams), responses(
    (status = 200, body = Vec<Transaction>),
    (status = 503, response = ErrorBodyResponse),
))]
pub async fn get_transactions(
    State(store): State<Arc<Store>>,
    Query(params): Query<GetTransactionsQueryParams>,
) -> Result<Json<Vec<Transaction>>, RestError> {
    let transactions = store
        .transaction_service
        .get_transactions(GetTransactionsInput {
            address: params.address.as_deref().map(Address::new),
        })
        .await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/v1/transactions/{transaction_hash}",
    params(("transaction_hash" = String, Path, description = "Hash of the ledger entry")),
    responses(
        (status = 200, body = Transaction),
        (status = 404, description = "Transaction was not found", body = ErrorBodyResponse),
    ),
)]
pub async fn get_transaction(
    State(store): State<Arc<Store>>,
    Path(transaction_hash): Path<String>,
) -> Result<Json<Transaction>, RestError> {
    let transaction = store
        .transaction_service
        .get_transaction_by_hash(GetTransactionByHashInput { transaction_hash })
        .await?;
    Ok(Json(transaction.into()))
}

pub fn get_routes() -> Router<Arc<Store>> {
    Router::new()
        .route("/", get(get_transactions))
        .route("/:transaction_hash", get(get_transaction))
}
