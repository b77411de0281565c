use {
    super::Repository,
    crate::{
        api::RestError,
        auction::entities,
    },
    time::OffsetDateTime,
};

impl Repository {
    pub async fn get_stale_pending_auctions(
        &self,
        created_before: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        self.db.get_stale_pending_auctions(created_before).await
    }
}
