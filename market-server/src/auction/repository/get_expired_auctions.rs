use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    /// Auctions still active whose end time is at or before `now`.
    pub async fn get_expired_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        self.db.get_expired_auctions(now).await
    }
}
