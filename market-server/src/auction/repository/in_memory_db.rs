use {
    super::Database,
    crate::{
        api::RestError,
        auction::entities,
    },
    axum::async_trait,
    std::{
        collections::HashMap,
        sync::{
            Arc,
            Mutex,
        },
    },
    time::OffsetDateTime,
};

/// Auction store kept in memory with the same conditional-write rules as the Postgres one.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDatabase {
    auctions: Arc<Mutex<HashMap<entities::AuctionId, entities::Auction>>>,
}

impl InMemoryDatabase {
    pub fn get(&self, auction_id: entities::AuctionId) -> Option<entities::Auction> {
        self.auctions.lock().unwrap().get(&auction_id).cloned()
    }

    pub fn all(&self) -> Vec<entities::Auction> {
        self.auctions.lock().unwrap().values().cloned().collect()
    }

    pub fn insert(&self, auction: entities::Auction) {
        self.auctions.lock().unwrap().insert(auction.id, auction);
    }

    pub fn update(
        &self,
        auction_id: entities::AuctionId,
        update: impl FnOnce(&mut entities::Auction),
    ) {
        if let Some(auction) = self.auctions.lock().unwrap().get_mut(&auction_id) {
            update(auction);
        }
    }

    fn update_if(
        &self,
        auction_id: entities::AuctionId,
        expected: entities::AuctionStatus,
        update: impl FnOnce(&mut entities::Auction),
    ) -> Option<entities::Auction> {
        let mut auctions = self.auctions.lock().unwrap();
        let auction = auctions.get_mut(&auction_id)?;
        if auction.status != expected {
            return None;
        }
        update(auction);
        Some(auction.clone())
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn add_auction(&self, auction: &entities::Auction) -> Result<(), RestError> {
        self.insert(auction.clone());
        Ok(())
    }

    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError> {
        Ok(self.get(auction_id))
    }

    async fn get_active_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let mut auctions: Vec<_> = self
            .all()
            .into_iter()
            .filter(|a| a.status == entities::AuctionStatus::Active && !a.is_expired_at(now))
            .collect();
        auctions.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));
        Ok(auctions)
    }

    async fn get_concluded_auctions(&self) -> Result<Vec<entities::Auction>, RestError> {
        let mut auctions: Vec<_> = self
            .all()
            .into_iter()
            .filter(|a| {
                matches!(
                    a.status,
                    entities::AuctionStatus::Completed
                        | entities::AuctionStatus::Expired
                        | entities::AuctionStatus::Cancelled
                )
            })
            .collect();
        auctions.sort_by(|a, b| b.completion_time.cmp(&a.completion_time));
        Ok(auctions)
    }

    async fn get_expired_auctions(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let mut auctions: Vec<_> = self
            .all()
            .into_iter()
            .filter(|a| a.status == entities::AuctionStatus::Active && a.is_expired_at(now))
            .collect();
        auctions.sort_by(|a, b| a.end_time.cmp(&b.end_time));
        Ok(auctions)
    }

    async fn get_stale_pending_auctions(
        &self,
        created_before: OffsetDateTime,
    ) -> Result<Vec<entities::Auction>, RestError> {
        let mut auctions: Vec<_> = self
            .all()
            .into_iter()
            .filter(|a| {
                a.status == entities::AuctionStatus::Pending && a.creation_time <= created_before
            })
            .collect();
        auctions.sort_by(|a, b| a.creation_time.cmp(&b.creation_time));
        Ok(auctions)
    }

    async fn activate_auction(
        &self,
        auction_id: entities::AuctionId,
        settlement_id: &entities::SettlementId,
    ) -> Result<Option<entities::Auction>, RestError> {
        Ok(
            self.update_if(auction_id, entities::AuctionStatus::Pending, |auction| {
                auction.status = entities::AuctionStatus::Active;
                auction.settlement_id = Some(settlement_id.clone());
            }),
        )
    }

    async fn fail_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<Option<entities::Auction>, RestError> {
        Ok(
            self.update_if(auction_id, entities::AuctionStatus::Pending, |auction| {
                auction.status = entities::AuctionStatus::Failed;
            }),
        )
    }

    async fn append_bid(
        &self,
        auction_id: entities::AuctionId,
        bid: &entities::Bid,
    ) -> Result<Option<entities::Auction>, RestError> {
        Ok(
            self.update_if(auction_id, entities::AuctionStatus::Active, |auction| {
                auction.bids.push(bid.clone());
            }),
        )
    }

    async fn conclude_auction(
        &self,
        auction_id: entities::AuctionId,
        conclusion: &entities::AuctionConclusion,
        completion_time: OffsetDateTime,
    ) -> Result<Option<entities::Auction>, RestError> {
        Ok(
            self.update_if(auction_id, entities::AuctionStatus::Active, |auction| {
                auction.status = conclusion.status();
                auction.completion_time = Some(completion_time);
                match conclusion {
                    entities::AuctionConclusion::Completed {
                        winner,
                        final_price,
                        method,
                    } => {
                        auction.winner = Some(winner.clone());
                        auction.final_price = Some(*final_price);
                        auction.completion_method = Some(*method);
                    }
                    entities::AuctionConclusion::Cancelled { method } => {
                        auction.completion_method = *method;
                    }
                    entities::AuctionConclusion::Expired => {}
                }
            }),
        )
    }
}
