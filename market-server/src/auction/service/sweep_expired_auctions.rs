use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        per_metrics::{
            AUCTION_SWEEP_CONCLUDED,
            AUCTION_SWEEP_DURATION,
        },
    },
    axum_prometheus::metrics,
    futures::{
        stream,
        StreamExt,
    },
    std::time::Instant,
    time::OffsetDateTime,
};

/// Expired auctions concluded at the same time. Each one holds a pool connection while it runs.
const SWEEP_CONCURRENCY: usize = 4;

impl Service {
    /// Returns whether the auction left the active state during this pass.
    async fn sweep_auction_for_lock(
        &self,
        auction_id: entities::AuctionId,
        lock: entities::AuctionLock,
    ) -> Result<bool, RestError> {
        let _lock = lock.lock().await;
        let auction = match self.repo.get_auction(auction_id).await? {
            Some(auction) if auction.status == entities::AuctionStatus::Active => auction,
            _ => return Ok(false),
        };
        if auction.bids.is_empty() {
            self.conclude_auction(
                &auction,
                entities::AuctionConclusion::Cancelled { method: None },
            )
            .await?;
            tracing::info!("Expired auction cancelled without bids");
            return Ok(true);
        }

        let buyer = auction.buyer.clone();
        match self
            .complete_locked(auction, buyer, entities::CompletionMethod::Automatic)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                tracing::warn!(error = ?err, "Automatic completion failed");
                let concluded = self
                    .repo
                    .conclude_auction(auction_id, &entities::AuctionConclusion::Expired)
                    .await?;
                if concluded.is_some() {
                    return Ok(true);
                }
                // Either the failed completion already expired it or another path concluded it.
                Ok(self
                    .repo
                    .get_auction(auction_id)
                    .await?
                    .is_some_and(|auction| auction.status == entities::AuctionStatus::Expired))
            }
        }
    }

    #[tracing::instrument(skip_all, fields(auction_id = %auction_id))]
    async fn sweep_auction(&self, auction_id: entities::AuctionId) -> bool {
        let lock = self
            .repo
            .get_or_create_in_memory_auction_lock(auction_id)
            .await;
        let result = self.sweep_auction_for_lock(auction_id, lock).await;
        self.repo.remove_in_memory_auction_lock(&auction_id).await;
        result.unwrap_or_else(|err| {
            tracing::error!(error = ?err, "Failed to sweep expired auction");
            false
        })
    }

    /// Marks pending auctions as failed once creation can no longer be in flight for them.
    ///
    /// A pending record this old belongs to a creation call that returned before it could
    /// resolve the record.
    async fn fail_stale_pending_auctions(&self, now: OffsetDateTime) -> Result<(), RestError> {
        let created_before = now - self.config.chain_timeout * 2;
        for auction in self.repo.get_stale_pending_auctions(created_before).await? {
            match self.repo.fail_auction(auction.id).await {
                Ok(Some(_)) => {
                    tracing::warn!(auction_id = %auction.id, "Stale pending auction marked as failed")
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(auction_id = %auction.id, error = ?err, "Failed to mark stale pending auction as failed")
                }
            }
        }
        Ok(())
    }

    /// Concludes every active auction whose end time has passed.
    ///
    /// Auctions are processed independently, so one failing auction never stops the others.
    /// Returns how many auctions left the active state.
    #[tracing::instrument(skip_all)]
    pub async fn sweep_expired_auctions(&self) -> Result<usize, RestError> {
        let started_at = Instant::now();
        let now = OffsetDateTime::now_utc();
        if let Err(err) = self.fail_stale_pending_auctions(now).await {
            tracing::error!(error = ?err, "Failed to resolve stale pending auctions");
        }
        let expired = self.repo.get_expired_auctions(now).await?;
        let concluded = stream::iter(expired.iter().map(|auction| auction.id).collect::<Vec<_>>())
            .map(|auction_id| self.sweep_auction(auction_id))
            .buffer_unordered(SWEEP_CONCURRENCY)
            .filter(|concluded| futures::future::ready(*concluded))
            .count()
            .await;

        metrics::gauge!(AUCTION_SWEEP_CONCLUDED).set(concluded as f64);
        metrics::histogram!(AUCTION_SWEEP_DURATION).record(started_at.elapsed().as_secs_f64());
        if !expired.is_empty() {
            tracing::info!(
                expired = expired.len(),
                concluded = concluded,
                "Expiration sweep finished"
            );
        }
        Ok(concluded)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            auction::{
                entities::tests::{
                    make_auction,
                    make_bid,
                },
                repository::InMemoryDatabase,
                service::{
                    complete_auction::CompleteAuctionInput,
                    tests::{
                        chain_client,
                        receipt,
                        BUYER,
                        PRODUCER_X,
                        PRODUCER_Y,
                    },
                },
            },
            kernel::{
                chain_client::ChainMethod,
                entities::Address,
            },
        },
        anyhow::anyhow,
        serde_json::json,
        time::Duration,
    };

    fn expired_auction(bids: Vec<entities::Bid>) -> entities::Auction {
        let mut auction = make_auction(bids);
        auction.end_time = OffsetDateTime::now_utc() - Duration::seconds(1);
        auction
    }

    #[tokio::test]
    async fn test_sweep_cancels_expired_auction_without_bids() {
        let db = InMemoryDatabase::default();
        let auction = expired_auction(vec![]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain.expect_submit().never();
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 1);
        let stored = db.get(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Cancelled);
        assert_eq!(stored.completion_method, None);
        assert!(stored.completion_time.is_some());
    }

    #[tokio::test]
    async fn test_sweep_completes_expired_auction_with_bids() {
        let db = InMemoryDatabase::default();
        let auction = expired_auction(vec![make_bid(PRODUCER_X, 90), make_bid(PRODUCER_Y, 70)]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .times(1)
            .withf(|call| {
                call.method == ChainMethod::SelectWinner && call.from == Address::new(BUYER)
            })
            .returning(|_| Ok(receipt("AuctionCompleted", json!({}))));
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 1);
        let stored = db.get(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Completed);
        assert_eq!(stored.winner, Some(Address::new(PRODUCER_Y)));
        assert_eq!(stored.final_price, Some(70));
        assert_eq!(
            stored.completion_method,
            Some(entities::CompletionMethod::Automatic)
        );
    }

    #[tokio::test]
    async fn test_sweep_expires_auction_when_chain_fails() {
        let db = InMemoryDatabase::default();
        let auction = expired_auction(vec![make_bid(PRODUCER_X, 90)]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .times(1)
            .returning(|_| Err(anyhow!("gateway unavailable")));
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 1);
        let stored = db.get(auction.id).unwrap();
        assert_eq!(stored.status, entities::AuctionStatus::Expired);
        assert!(stored.completion_time.is_some());
        assert!(stored.winner.is_none());
        assert!(stored.final_price.is_none());
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let db = InMemoryDatabase::default();
        let cancelled = expired_auction(vec![]);
        let expired = expired_auction(vec![make_bid(PRODUCER_X, 90)]);
        db.insert(cancelled.clone());
        db.insert(expired.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .times(1)
            .returning(|_| Err(anyhow!("gateway unavailable")));
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 2);
        let after_first = (db.get(cancelled.id).unwrap(), db.get(expired.id).unwrap());
        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 0);
        assert_eq!(
            (db.get(cancelled.id).unwrap(), db.get(expired.id).unwrap()),
            after_first
        );
    }

    #[tokio::test]
    async fn test_sweep_ignores_running_and_concluded_auctions() {
        let db = InMemoryDatabase::default();
        let running = make_auction(vec![make_bid(PRODUCER_X, 90)]);
        let mut completed = expired_auction(vec![make_bid(PRODUCER_X, 90)]);
        completed.status = entities::AuctionStatus::Completed;
        db.insert(running.clone());
        db.insert(completed.clone());
        let mut chain = chain_client();
        chain.expect_submit().never();
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 0);
        assert_eq!(db.get(running.id).unwrap(), running);
        assert_eq!(db.get(completed.id).unwrap(), completed);
    }

    #[tokio::test]
    async fn test_sweep_isolates_failures_per_auction() {
        let db = InMemoryDatabase::default();
        let inconsistent = {
            let mut auction = expired_auction(vec![make_bid(PRODUCER_X, 90)]);
            auction.settlement_id = None;
            auction
        };
        let cancelled = expired_auction(vec![]);
        db.insert(inconsistent.clone());
        db.insert(cancelled.clone());
        let mut chain = chain_client();
        chain.expect_submit().never();
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 2);
        assert_eq!(
            db.get(cancelled.id).unwrap().status,
            entities::AuctionStatus::Cancelled
        );
        assert_eq!(
            db.get(inconsistent.id).unwrap().status,
            entities::AuctionStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_sweep_fails_stale_pending_auctions() {
        let db = InMemoryDatabase::default();
        let mut stale = make_auction(vec![]);
        stale.status = entities::AuctionStatus::Pending;
        stale.settlement_id = None;
        stale.creation_time = OffsetDateTime::now_utc() - Duration::minutes(10);
        let mut fresh = stale.clone();
        fresh.id = uuid::Uuid::new_v4();
        fresh.creation_time = OffsetDateTime::now_utc();
        db.insert(stale.clone());
        db.insert(fresh.clone());
        let mut chain = chain_client();
        chain.expect_submit().never();
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(service.sweep_expired_auctions().await.unwrap(), 0);
        assert_eq!(
            db.get(stale.id).unwrap().status,
            entities::AuctionStatus::Failed
        );
        assert_eq!(db.get(fresh.id).unwrap(), fresh);
    }

    #[tokio::test]
    async fn test_sweep_concludes_more_auctions_than_its_concurrency() {
        let db = InMemoryDatabase::default();
        let auctions: Vec<_> = (0..SWEEP_CONCURRENCY * 3)
            .map(|_| expired_auction(vec![]))
            .collect();
        for auction in &auctions {
            db.insert(auction.clone());
        }
        let service = Service::new_with_mocks(db.clone(), chain_client());

        assert_eq!(
            service.sweep_expired_auctions().await.unwrap(),
            auctions.len()
        );
        assert!(auctions.iter().all(|auction| {
            db.get(auction.id).unwrap().status == entities::AuctionStatus::Cancelled
        }));
    }

    #[tokio::test]
    async fn test_sweep_and_manual_completion_conclude_once() {
        let db = InMemoryDatabase::default();
        let auction = expired_auction(vec![make_bid(PRODUCER_X, 90)]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .times(1)
            .returning(|_| Ok(receipt("AuctionCompleted", json!({}))));
        let service = Service::new_with_mocks(db.clone(), chain);

        let (swept, manual) = tokio::join!(
            service.sweep_expired_auctions(),
            service.complete_auction(CompleteAuctionInput {
                auction_id: auction.id,
                buyer:      Address::new(BUYER),
                trigger:    entities::CompletionMethod::Manual,
            }),
        );
        let swept = swept.unwrap();
        match manual {
            Ok(output) => {
                assert_eq!(swept, 0);
                assert_eq!(
                    output.auction.completion_method,
                    Some(entities::CompletionMethod::Manual)
                );
            }
            Err(err) => {
                assert_eq!(swept, 1);
                assert_eq!(
                    err,
                    RestError::AuctionNotActive(entities::AuctionStatus::Completed)
                );
            }
        }
        assert_eq!(
            db.get(auction.id).unwrap().status,
            entities::AuctionStatus::Completed
        );
    }
}
