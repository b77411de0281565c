use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Service {
    /// Completed, expired and cancelled auctions, most recently concluded first.
    pub async fn get_concluded_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        self.repo.get_concluded_auctions().await
    }
}
