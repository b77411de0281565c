use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    #[tracing::instrument(skip_all, fields(auction_id = %auction_id, status = %conclusion.status()))]
    pub async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        conclusion: &entities::AuctionConclusion,
    ) -> Result<Option<entities::Auction>, RestError> {
        let auction = self
            .db
            .conclude_auction(auction_id, conclusion, OffsetDateTime::now_utc())
            .await?;
        if auction.is_none() {
            tracing::debug!("Auction was no longer active");
        }
        Ok(auction)
    }
}
