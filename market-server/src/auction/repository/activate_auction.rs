use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    pub async fn activate_auction(
        &self,
        auction_id: entities::AuctionId,
        settlement_id: &entities::SettlementId,
    ) -> Result<Option<entities::Auction>, RestError> {
        self.db.activate_auction(auction_id, settlement_id).await
    }
}
