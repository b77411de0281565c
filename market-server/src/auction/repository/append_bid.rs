use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Appends the bid only while the auction is active.
    pub async fn append_bid(
        &self,
        auction_id: entities::AuctionId,
        bid: &entities::Bid,
    ) -> Result<Option<entities::Auction>, RestError> {
        self.db.append_bid(auction_id, bid).await
    }
}
