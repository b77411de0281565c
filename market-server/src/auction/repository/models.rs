#[cfg(test)]
use mockall::automock;
use {
    crate::{
        api::RestError,
        auction::entities,
        kernel::{
            db::DB,
            entities::Address,
        },
    },
    axum::async_trait,
    serde::{
        Deserialize,
        Serialize,
    },
    sqlx::{
        types::{
            BigDecimal,
            Json,
        },
        FromRow,
    },
    std::fmt::Debug,
    time::{
        OffsetDateTime,
        PrimitiveDateTime,
        UtcOffset,
    },
    tracing::instrument,
    uuid::Uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "lowercase")]
pub enum AuctionStatus {
    Pending,
    Active,
    Completed,
    Expired,
    Cancelled,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_completion_method", rename_all = "lowercase")]
pub enum CompletionMethod {
    Manual,
    Automatic,
}

impl From<entities::AuctionStatus> for AuctionStatus {
    fn from(status: entities::AuctionStatus) -> Self {
        match status {
            entities::AuctionStatus::Pending => Self::Pending,
            entities::AuctionStatus::Active => Self::Active,
            entities::AuctionStatus::Completed => Self::Completed,
            entities::AuctionStatus::Expired => Self::Expired,
            entities::AuctionStatus::Cancelled => Self::Cancelled,
            entities::AuctionStatus::Failed => Self::Failed,
        }
    }
}

impl From<AuctionStatus> for entities::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Pending => Self::Pending,
            AuctionStatus::Active => Self::Active,
            AuctionStatus::Completed => Self::Completed,
            AuctionStatus::Expired => Self::Expired,
            AuctionStatus::Cancelled => Self::Cancelled,
            AuctionStatus::Failed => Self::Failed,
        }
    }
}

impl From<entities::CompletionMethod> for CompletionMethod {
    fn from(method: entities::CompletionMethod) -> Self {
        match method {
            entities::CompletionMethod::Manual => Self::Manual,
            entities::CompletionMethod::Automatic => Self::Automatic,
        }
    }
}

impl From<CompletionMethod> for entities::CompletionMethod {
    fn from(method: CompletionMethod) -> Self {
        match method {
            CompletionMethod::Manual => Self::Manual,
            CompletionMethod::Automatic => Self::Automatic,
        }
    }
}

/// Bids live in a JSONB array on the auction row so that appending is a single conditional update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder:          String,
    pub unit_price:      u64,
    #[serde(with = "time::serde::rfc3339")]
    pub submission_time: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_bid_id:    Option<String>,
}

impl From<&entities::Bid> for Bid {
    fn from(bid: &entities::Bid) -> Self {
        Self {
            bidder:          bid.bidder.to_string(),
            unit_price:      bid.unit_price,
            submission_time: bid.submission_time,
            chain_bid_id:    bid.chain_bid_id.clone(),
        }
    }
}

impl From<Bid> for entities::Bid {
    fn from(bid: Bid) -> Self {
        Self {
            bidder:          Address::new(&bid.bidder),
            unit_price:      bid.unit_price,
            submission_time: bid.submission_time,
            chain_bid_id:    bid.chain_bid_id,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Auction {
    pub id:                Uuid,
    pub settlement_id:     Option<String>,
    pub buyer:             String,
    pub amount:            BigDecimal,
    pub max_unit_price:    BigDecimal,
    pub end_time:          PrimitiveDateTime,
    pub status:            AuctionStatus,
    pub bids:              serde_json::Value,
    pub winner:            Option<String>,
    pub final_price:       Option<BigDecimal>,
    pub completion_time:   Option<PrimitiveDateTime>,
    pub completion_method: Option<CompletionMethod>,
    pub city:              Option<String>,
    pub latitude:          Option<f64>,
    pub longitude:         Option<f64>,
    pub creation_time:     PrimitiveDateTime,
}

impl TryFrom<Auction> for entities::Auction {
    type Error = anyhow::Error;

    fn try_from(auction: Auction) -> Result<Self, Self::Error> {
        let bids: Vec<Bid> = serde_json::from_value(auction.bids)?;
        let final_price = match auction.final_price {
            Some(price) => Some(price.to_string().parse()?),
            None => None,
        };
        Ok(Self {
            id: auction.id,
            settlement_id: auction.settlement_id,
            buyer: Address::new(&auction.buyer),
            amount: auction.amount.to_string().parse()?,
            max_unit_price: auction.max_unit_price.to_string().parse()?,
            end_time: auction.end_time.assume_utc(),
            status: auction.status.into(),
            bids: bids.into_iter().map(Into::into).collect(),
            winner: auction.winner.as_deref().map(Address::new),
            final_price,
            completion_time: auction.completion_time.map(PrimitiveDateTime::assume_utc),
            completion_method: auction.completion_method.map(Into::into),
            location: entities::AuctionLocation {
                city:      auction.city,
                latitude:  auction.latitude,
                longitude: auction.longitude,
            },
            creation_time: auction.creation_time.assume_utc(),
        })
    }
}

fn to_primitive(time: OffsetDateTime) -> PrimitiveDateTime {
    let time = time.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(time.date(), time.time())
}

fn into_entity(auction: Auction) -> Result<entities::Auction, RestError> {
    let id = auction.id;
    auction.try_into().map_err(|e: anyhow::Error| {
        tracing::error!(
            error = e.to_string(),
            auction_id = %id,
            "Failed to convert database auction to entity auction",
        );
        RestError::TemporarilyUnavailable
    })
}

/// Rows that fail to convert are logged and left out.
fn into_entities(auctions: Vec<Auction>) -> Vec<entities::Auction> {
    auctions
        .into_iter()
        .filter_map(|auction| into_entity(auction).ok())
        .collect()
}

/// Auction store. Every status change is a conditional write on the expected current status;
/// `None` means the auction was not in that status and nothing was written.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError>;
    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError>;
    async fn get_active_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError>;
    async fn get_concluded_auctions(&self) -> Result<Vec<entities::Auction>, RestError>;
    async fn get_expired_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError>;
    async fn get_stale_pending_auctions(
        &self,
        created_before: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError>;
    async fn activate_auction(
        &self,
        auction_id: entities::AuctionId,
        settlement_id: &entities::SettlementId,
    ) -> Result<Option<entities::Auction>, RestError>;
    async fn fail_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError>;
    async fn append_bid(
        &self,
        auction_id: entities::AuctionId,
        bid: &entities::Bid,
    ) -> Result<Option<entities::Auction>, RestError>;
    async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        conclusion: &entities::AuctionConclusion,
        completion_time: OffsetDateTime,
    ) -> Result<Option<entities::Auction>, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_auction",
        fields(
            category = "db_queries",
            result = "success",
            name = "add_auction",
            tracing_enabled
        ),
        skip_all
    )]
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        let bids: Vec<Bid> = auction.bids.iter().map(Into::into).collect();
        sqlx::query(
            "INSERT INTO auction (id, settlement_id, buyer, amount, max_unit_price, end_time, status, bids, city, latitude, longitude, creation_time) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(auction.id)
        .bind(&auction.settlement_id)
        .bind(auction.buyer.as_str())
        .bind(BigDecimal::from(auction.amount))
        .bind(BigDecimal::from(auction.max_unit_price))
        .bind(to_primitive(auction.end_time))
        .bind(AuctionStatus::from(auction.status))
        .bind(Json(bids))
        .bind(&auction.location.city)
        .bind(auction.location.latitude)
        .bind(auction.location.longitude)
        .bind(to_primitive(auction.creation_time))
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction_id = %auction.id, "DB: Failed to insert auction");
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_auction",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_auction",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError> {
        let auction: Option<Auction> = sqlx::query_as("SELECT * FROM auction WHERE id = $1")
            .bind(auction_id)
            .fetch_optional(self)
            .await
            .map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(error = e.to_string(), auction_id = %auction_id, "DB: Failed to get auction");
                RestError::TemporarilyUnavailable
            })?;
        auction.map(into_entity).transpose()
    }

    #[instrument(
        target = "metrics",
        name = "db_get_active_auctions",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_active_auctions",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_active_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let auctions: Vec<Auction> = sqlx::query_as(
            "SELECT * FROM auction WHERE status = $1 AND end_time > $2 ORDER BY creation_time DESC",
        )
        .bind(AuctionStatus::Active)
        .bind(to_primitive(now))
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to get active auctions");
            RestError::TemporarilyUnavailable
        })?;
        Ok(into_entities(auctions))
    }

    #[instrument(
        target = "metrics",
        name = "db_get_concluded_auctions",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_concluded_auctions",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_concluded_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        let auctions: Vec<Auction> = sqlx::query_as(
            "SELECT * FROM auction WHERE status IN ($1, $2, $3) ORDER BY completion_time DESC NULLS LAST",
        )
        .bind(AuctionStatus::Completed)
        .bind(AuctionStatus::Expired)
        .bind(AuctionStatus::Cancelled)
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to get concluded auctions");
            RestError::TemporarilyUnavailable
        })?;
        Ok(into_entities(auctions))
    }

    #[instrument(
        target = "metrics",
        name = "db_get_expired_auctions",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_expired_auctions",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_expired_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let auctions: Vec<Auction> = sqlx::query_as(
            "SELECT * FROM auction WHERE status = $1 AND end_time <= $2 ORDER BY end_time ASC",
        )
        .bind(AuctionStatus::Active)
        .bind(to_primitive(now))
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to get expired auctions");
            RestError::TemporarilyUnavailable
        })?;
        Ok(into_entities(auctions))
    }

    #[instrument(
        target = "metrics",
        name = "db_get_stale_pending_auctions",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_stale_pending_auctions",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_stale_pending_auctions(
        &self,
        created_before: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let auctions: Vec<Auction> = sqlx::query_as(
            "SELECT * FROM auction WHERE status = $1 AND creation_time <= $2 ORDER BY creation_time ASC",
        )
        .bind(AuctionStatus::Pending)
        .bind(to_primitive(created_before))
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), "DB: Failed to get stale pending auctions");
            RestError::TemporarilyUnavailable
        })?;
        Ok(into_entities(auctions))
    }

    #[instrument(
        target = "metrics",
        name = "db_activate_auction",
        fields(
            category = "db_queries",
            result = "success",
            name = "activate_auction",
            tracing_enabled
        ),
        skip_all
    )]
    async fn activate_auction(
        &self,
        auction_id: entities::AuctionId,
        settlement_id: &entities::SettlementId,
    ) -> Result<Option<entities::Auction>, RestError> {
        let auction: Option<Auction> = sqlx::query_as(
            "UPDATE auction SET status = $1, settlement_id = $2 WHERE id = $3 AND status = $4 RETURNING *",
        )
        .bind(AuctionStatus::Active)
        .bind(settlement_id)
        .bind(auction_id)
        .bind(AuctionStatus::Pending)
        .fetch_optional(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction_id = %auction_id, "DB: Failed to activate auction");
            RestError::TemporarilyUnavailable
        })?;
        auction.map(into_entity).transpose()
    }

    #[instrument(
        target = "metrics",
        name = "db_fail_auction",
        fields(
            category = "db_queries",
            result = "success",
            name = "fail_auction",
            tracing_enabled
        ),
        skip_all
    )]
    async fn fail_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError> {
        let auction: Option<Auction> = sqlx::query_as(
            "UPDATE auction SET status = $1 WHERE id = $2 AND status = $3 RETURNING *",
        )
        .bind(AuctionStatus::Failed)
        .bind(auction_id)
        .bind(AuctionStatus::Pending)
        .fetch_optional(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction_id = %auction_id, "DB: Failed to mark auction as failed");
            RestError::TemporarilyUnavailable
        })?;
        auction.map(into_entity).transpose()
    }

    #[instrument(
        target = "metrics",
        name = "db_append_bid",
        fields(
            category = "db_queries",
            result = "success",
            name = "append_bid",
            tracing_enabled
        ),
        skip_all
    )]
    async fn append_bid(
        &self,
        auction_id: entities::AuctionId,
        bid: &entities::Bid,
    ) -> Result<Option<entities::Auction>, RestError> {
        let auction: Option<Auction> = sqlx::query_as(
            "UPDATE auction SET bids = bids || $1 WHERE id = $2 AND status = $3 RETURNING *",
        )
        .bind(Json(vec![Bid::from(bid)]))
        .bind(auction_id)
        .bind(AuctionStatus::Active)
        .fetch_optional(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction_id = %auction_id, "DB: Failed to append bid");
            RestError::TemporarilyUnavailable
        })?;
        auction.map(into_entity).transpose()
    }

    #[instrument(
        target = "metrics",
        name = "db_conclude_auction",
        fields(
            category = "db_queries",
            result = "success",
            name = "conclude_auction",
            tracing_enabled
        ),
        skip_all
    )]
    async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        conclusion: &entities::AuctionConclusion,
        completion_time: OffsetDateTime,
    ) -> Result<Option<entities::Auction>, RestError> {
        let (winner, final_price, method) = match conclusion {
            entities::AuctionConclusion::Completed {
                winner,
                final_price,
                method,
            } => (
                Some(winner.to_string()),
                Some(BigDecimal::from(*final_price)),
                Some(CompletionMethod::from(*method)),
            ),
            entities::AuctionConclusion::Cancelled { method } => {
                (None, None, method.map(CompletionMethod::from))
            }
            entities::AuctionConclusion::Expired => (None, None, None),
        };
        let auction: Option<Auction> = sqlx::query_as(
            "UPDATE auction SET status = $1, winner = $2, final_price = $3, completion_method = $4, completion_time = $5 WHERE id = $6 AND status = $7 RETURNING *",
        )
        .bind(AuctionStatus::from(conclusion.status()))
        .bind(winner)
        .bind(final_price)
        .bind(method)
        .bind(to_primitive(completion_time))
        .bind(auction_id)
        .bind(AuctionStatus::Active)
        .fetch_optional(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(error = e.to_string(), auction_id = %auction_id, "DB: Failed to conclude auction");
            RestError::TemporarilyUnavailable
        })?;
        auction.map(into_entity).transpose()
    }
}
