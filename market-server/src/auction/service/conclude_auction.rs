use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
    },
};

impl Service {
    /// Moves an active auction to its conclusion.
    ///
    /// The write only lands while the stored auction is still active, so when two paths race to
    /// conclude the same auction the loser gets `AuctionNotActive` and nothing changes.
    pub(super) async fn conclude_auction(
        &self,
        auction: &entities::Auction,
        conclusion: entities::AuctionConclusion,
    ) -> Result<entities::Auction, RestError> {
        if let Some(concluded) = self.repo.conclude_auction(auction.id, &conclusion).await? {
            return Ok(concluded);
        }
        let status = self
            .repo
            .get_auction(auction.id)
            .await?
            .map_or(auction.status, |current| current.status);
        if !status.is_terminal() {
            tracing::warn!(status = %status, "Auction left the active state without concluding");
        }
        Err(RestError::AuctionNotActive(status))
    }
}
