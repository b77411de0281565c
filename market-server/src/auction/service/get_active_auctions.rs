use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Service {
    /// Active auctions that are still open for bids, newest first.
    pub async fn get_active_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        self.repo
            .get_active_auctions(OffsetDateTime::now_utc())
            .await
    }
}
