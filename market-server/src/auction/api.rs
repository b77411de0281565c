use {
    super::{
        entities,
        service::{
            complete_auction::CompleteAuctionInput,
            create_auction::CreateAuctionInput,
            get_auction::GetAuctionInput,
            place_bid::PlaceBidInput,
        },
    },
    crate::{
        api::{
            Auth,
            RestError,
        },
        state::Store,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        http::StatusCode,
        routing::{
            get,
            post,
        },
        Json,
        Router,
    },
    energy_market_api_types::{
        auction::{
            Auction,
            AuctionComplete,
            AuctionCompleteResult,
            AuctionCreate,
            AuctionCreateResult,
            AuctionId,
            BidCreate,
            BidResult,
        },
        ErrorBodyResponse,
    },
    std::sync::Arc,
};

/// Open a reverse auction for an amount of energy.
///
/// Only consumers can open auctions. The auction is registered on chain before it accepts bids;
/// when the chain rejects it, the failed auction is returned along with the error.
#[utoipa::path(post, path = "/v1/auctions", request_body = AuctionCreate,
    security(
        ("bearerAuth" = []),
    ),
    responses(
        (status = 201, description = "Auction was created and is active", body = AuctionCreateResult),
        (status = 400, response = ErrorBodyResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorBodyResponse),
        (status = 403, description = "The buyer is a producer", body = ErrorBodyResponse),
        (status = 500, description = "The chain rejected the auction", body = ErrorBodyResponse),
    ),
)]
pub async fn post_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Json(auction_create): Json<AuctionCreate>,
) -> Result<(StatusCode, Json<AuctionCreateResult>), RestError> {
    let output = store
        .auction_service
        .create_auction(CreateAuctionInput {
            buyer:          auth.acting_address(auction_create.buyer)?,
            amount:         auction_create.amount,
            max_unit_price: auction_create.max_unit_price,
            duration:       auction_create.duration,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AuctionCreateResult {
            auction:     store.auction_service.enrich_auction(&output.auction).await,
            transaction: output.transaction.into(),
            auction_id:  output.settlement_id,
        }),
    ))
}

/// Bid on an active auction.
///
/// The bid is recorded once the chain accepts it. Lower unit prices win.
#[utoipa::path(post, path = "/v1/auctions/{auction_id}/bid", request_body = BidCreate,
    security(
        ("bearerAuth" = []),
    ),
    params(("auction_id" = String, Path, description = "Id of the auction")),
    responses(
        (status = 200, description = "Bid was placed", body = BidResult),
        (status = 400, response = ErrorBodyResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorBodyResponse),
        (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
        (status = 500, description = "The chain rejected the bid", body = ErrorBodyResponse),
    ),
)]
pub async fn post_bid(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
    Json(bid_create): Json<BidCreate>,
) -> Result<Json<BidResult>, RestError> {
    let output = store
        .auction_service
        .place_bid(PlaceBidInput {
            auction_id,
            bidder: auth.acting_address(bid_create.bidder)?,
            unit_price: bid_create.unit_price,
        })
        .await?;
    Ok(Json(BidResult {
        auction:     store.auction_service.enrich_auction(&output.auction).await,
        transaction: output.transaction.into(),
        bid_id:      output.bid_id,
    }))
}

/// Settle an active auction with its lowest bid.
///
/// An auction without bids is cancelled instead. If the chain rejects the settlement the auction
/// stays active and the call can be retried.
#[utoipa::path(put, path = "/v1/auctions/{auction_id}/complete", request_body = AuctionComplete,
    security(
        ("bearerAuth" = []),
    ),
    params(("auction_id" = String, Path, description = "Id of the auction")),
    responses(
        (status = 200, description = "Auction was concluded", body = AuctionCompleteResult),
        (status = 400, response = ErrorBodyResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorBodyResponse),
        (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
        (status = 500, description = "The chain rejected the settlement", body = ErrorBodyResponse),
    ),
)]
pub async fn complete_auction(
    auth: Auth,
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
    Json(auction_complete): Json<AuctionComplete>,
) -> Result<Json<AuctionCompleteResult>, RestError> {
    let output = store
        .auction_service
        .complete_auction(CompleteAuctionInput {
            auction_id,
            buyer: auth.acting_address(auction_complete.buyer)?,
            trigger: entities::CompletionMethod::Manual,
        })
        .await?;
    Ok(Json(AuctionCompleteResult {
        auction:     store.auction_service.enrich_auction(&output.auction).await,
        transaction: output.transaction.map(Into::into),
        winner:      output.winner.map(Into::into),
        final_price: output.final_price,
    }))
}

/// List auctions that are open for bids, newest first.
#[utoipa::path(get, path = "/v1/auctions/active", responses(
    (status = 200, body = Vec<Auction>),
    (status = 503, response = ErrorBodyResponse),
))]
pub async fn get_active_auctions(
    State(store): State<Arc<Store>>,
) -> Result<Json<Vec<Auction>>, RestError> {
    let auctions = store.auction_service.get_active_auctions().await?;
    Ok(Json(store.auction_service.enrich_auctions(&auctions).await))
}

/// List concluded auctions, most recently concluded first.
///
/// Completed, expired and cancelled auctions are included.
#[utoipa::path(get, path = "/v1/auctions/completed", responses(
    (status = 200, body = Vec<Auction>),
    (status = 503, response = ErrorBodyResponse),
))]
pub async fn get_completed_auctions(
    State(store): State<Arc<Store>>,
) -> Result<Json<Vec<Auction>>, RestError> {
    let auctions = store.auction_service.get_concluded_auctions().await?;
    Ok(Json(store.auction_service.enrich_auctions(&auctions).await))
}

#[utoipa::path(get, path = "/v1/auctions/{auction_id}",
    params(("auction_id" = String, Path, description = "Id of the auction")),
    responses(
        (status = 200, body = Auction),
        (status = 404, description = "Auction was not found", body = ErrorBodyResponse),
    ),
)]
pub async fn get_auction(
    State(store): State<Arc<Store>>,
    Path(auction_id): Path<AuctionId>,
) -> Result<Json<Auction>, RestError> {
    let auction = store
        .auction_service
        .get_auction(GetAuctionInput { auction_id })
        .await?;
    Ok(Json(store.auction_service.enrich_auction(&auction).await))
}

pub fn get_routes() -> Router<Arc<Store>> {
    Router::new()
        .route("/", post(post_auction))
        .route("/create", post(post_auction))
        .route("/active", get(get_active_auctions))
        .route("/completed", get(get_completed_auctions))
        .route("/:auction_id", get(get_auction))
        .route("/:auction_id/bid", post(post_bid))
        .route(
            "/:auction_id/complete",
            post(complete_auction).put(complete_auction),
        )
}
