use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    /// Active auctions that have not reached their end time, newest first.
    pub async fn get_active_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        self.db.get_active_auctions(now).await
    }
}
