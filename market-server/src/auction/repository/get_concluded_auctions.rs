use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Repository {
    /// Completed, expired and cancelled auctions, most recently concluded first.
    pub async fn get_concluded_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        self.db.get_concluded_auctions().await
    }
}
