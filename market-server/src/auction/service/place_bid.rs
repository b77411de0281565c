use {
    super::Service,
    crate::{
        api::RestError,
        auction::entities,
        kernel::{
            chain_client::{
                ChainCall,
                ChainMethod,
            },
            entities::Address,
        },
        transaction::{
            entities::{
                Transaction,
                TransactionType,
            },
            service::record_transaction::RecordTransactionInput,
        },
    },
    serde_json::json,
    time::OffsetDateTime,
};

const BID_PLACED_EVENT: &str = "BidPlaced";
const BID_ID_ARG: &str = "bidId";

pub struct PlaceBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder:     Address,
    pub unit_price: u64,
}

#[derive(Debug, Clone)]
pub struct PlaceBidOutput {
    pub auction:     entities::Auction,
    pub transaction: Transaction,
    pub bid_id:      Option<String>,
}

impl Service {
    async fn place_bid_for_lock(
        &self,
        input: PlaceBidInput,
        lock: entities::AuctionLock,
    ) -> Result<PlaceBidOutput, RestError> {
        let _lock = lock.lock().await;
        let auction = self
            .repo
            .get_auction(input.auction_id)
            .await?
            .ok_or(RestError::AuctionNotFound)?;
        if auction.status != entities::AuctionStatus::Active {
            return Err(RestError::AuctionNotActive(auction.status));
        }
        let settlement_id = auction.settlement_id.clone().ok_or_else(|| {
            tracing::error!("Active auction has no settlement id");
            RestError::InconsistentAuction("active auction has no settlement id".to_string())
        })?;

        let receipt = self
            .submit_to_chain(ChainCall {
                method: ChainMethod::PlaceBid,
                args:   vec![json!(settlement_id), json!(input.unit_price)],
                from:   input.bidder.clone(),
            })
            .await
            .map_err(|err| {
                tracing::warn!(error = ?err, "Chain rejected bid");
                RestError::ChainSubmissionFailed {
                    reason:  err.to_string(),
                    auction: None,
                }
            })?;
        let bid_id = receipt.event_arg(BID_PLACED_EVENT, BID_ID_ARG);

        let bid = entities::Bid {
            bidder:          input.bidder.clone(),
            unit_price:      input.unit_price,
            submission_time: OffsetDateTime::now_utc(),
            chain_bid_id:    bid_id.clone(),
        };
        let auction = match self.repo.append_bid(auction.id, &bid).await? {
            Some(auction) => auction,
            None => {
                tracing::error!(
                    bidder = %input.bidder,
                    "Chain accepted a bid on an auction that is no longer active"
                );
                let status = self
                    .repo
                    .get_auction(auction.id)
                    .await?
                    .map_or(auction.status, |current| current.status);
                return Err(RestError::AuctionNotActive(status));
            }
        };

        let transaction = self
            .transaction_service
            .record_transaction(RecordTransactionInput {
                transaction_type: TransactionType::Auction,
                reference:        auction.id.to_string(),
                from:             input.bidder,
                to:               self.chain_client.market_address(),
                amount:           auction.amount,
                price:            input.unit_price,
                receipt_id:       receipt.receipt_id,
            })
            .await?;

        Ok(PlaceBidOutput {
            auction,
            transaction,
            bid_id,
        })
    }

    /// Places a producer's bid on an active auction.
    ///
    /// Bids on the same auction are serialized, and the bid is only stored once the chain has
    /// accepted it.
    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id, bidder = %input.bidder))]
    pub async fn place_bid(&self, input: PlaceBidInput) -> Result<PlaceBidOutput, RestError> {
        if input.bidder.is_empty() {
            return Err(RestError::BadParameters("bidder is required".to_string()));
        }
        let auction_id = input.auction_id;
        let lock = self
            .repo
            .get_or_create_in_memory_auction_lock(auction_id)
            .await;
        let result = self.place_bid_for_lock(input, lock).await;
        self.repo.remove_in_memory_auction_lock(&auction_id).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::auction::{
            entities::tests::{
                make_auction,
                make_bid,
            },
            repository::InMemoryDatabase,
            service::tests::{
                chain_client,
                receipt,
                MARKET,
                PRODUCER_X,
                PRODUCER_Y,
            },
        },
        anyhow::anyhow,
        uuid::Uuid,
    };

    fn input(auction_id: entities::AuctionId, bidder: &str, unit_price: u64) -> PlaceBidInput {
        PlaceBidInput {
            auction_id,
            bidder: Address::new(bidder),
            unit_price,
        }
    }

    fn accepting_chain() -> crate::kernel::chain_client::MockChainClient {
        let mut chain = chain_client();
        chain
            .expect_submit()
            .withf(|call| call.method == ChainMethod::PlaceBid)
            .returning(|call| {
                Ok(receipt(
                    "BidPlaced",
                    json!({"bidId": call.args[1].to_string()}),
                ))
            });
        chain
    }

    #[tokio::test]
    async fn test_place_bid_appends_bid_and_records_transaction() {
        let db = InMemoryDatabase::default();
        let auction = make_auction(vec![]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .times(1)
            .withf(|call| {
                call.method == ChainMethod::PlaceBid
                    && call.args == vec![json!("7"), json!(90)]
                    && call.from == Address::new(PRODUCER_X)
            })
            .returning(|_| Ok(receipt("BidPlaced", json!({"bidId": 3}))));
        let service = Service::new_with_mocks(db.clone(), chain);

        let output = service
            .place_bid(input(auction.id, PRODUCER_X, 90))
            .await
            .unwrap();
        assert_eq!(output.bid_id.as_deref(), Some("3"));
        assert_eq!(output.auction.bids.len(), 1);
        assert_eq!(output.auction.bids[0].bidder, Address::new(PRODUCER_X));
        assert_eq!(output.auction.bids[0].unit_price, 90);
        assert_eq!(output.auction.bids[0].chain_bid_id.as_deref(), Some("3"));
        assert_eq!(output.transaction.from, Address::new(PRODUCER_X));
        assert_eq!(output.transaction.to, Address::new(MARKET));
        assert_eq!(output.transaction.amount, auction.amount);
        assert_eq!(output.transaction.price, 90);
        assert_eq!(db.get(auction.id).unwrap().bids, output.auction.bids);
    }

    #[tokio::test]
    async fn test_place_bid_without_bid_id_still_succeeds() {
        let db = InMemoryDatabase::default();
        let auction = make_auction(vec![]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .returning(|_| Ok(receipt("Transfer", json!({}))));
        let service = Service::new_with_mocks(db.clone(), chain);

        let output = service
            .place_bid(input(auction.id, PRODUCER_X, 90))
            .await
            .unwrap();
        assert_eq!(output.bid_id, None);
        assert_eq!(db.get(auction.id).unwrap().bids.len(), 1);
    }

    #[tokio::test]
    async fn test_place_bid_chain_failure_mutates_nothing() {
        let db = InMemoryDatabase::default();
        let auction = make_auction(vec![make_bid(PRODUCER_Y, 95)]);
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain
            .expect_submit()
            .returning(|_| Err(anyhow!("bid above maximum")));
        let service = Service::new_with_mocks(db.clone(), chain);

        let err = service
            .place_bid(input(auction.id, PRODUCER_X, 200))
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::ChainSubmissionFailed { auction: None, .. }));
        assert_eq!(db.get(auction.id).unwrap(), auction);
    }

    #[tokio::test]
    async fn test_place_bid_rejects_missing_and_inactive_auctions() {
        let db = InMemoryDatabase::default();
        let mut completed = make_auction(vec![]);
        completed.status = entities::AuctionStatus::Completed;
        db.insert(completed.clone());
        let mut chain = chain_client();
        chain.expect_submit().never();
        let service = Service::new_with_mocks(db.clone(), chain);

        assert_eq!(
            service
                .place_bid(input(Uuid::new_v4(), PRODUCER_X, 90))
                .await
                .unwrap_err(),
            RestError::AuctionNotFound
        );
        assert_eq!(
            service
                .place_bid(input(completed.id, PRODUCER_X, 90))
                .await
                .unwrap_err(),
            RestError::AuctionNotActive(entities::AuctionStatus::Completed)
        );
        assert!(matches!(
            service.place_bid(input(completed.id, "  ", 90)).await,
            Err(RestError::BadParameters(_))
        ));
        assert!(db.get(completed.id).unwrap().bids.is_empty());
    }

    #[tokio::test]
    async fn test_place_bid_on_active_auction_without_settlement_id_is_inconsistent() {
        let db = InMemoryDatabase::default();
        let mut auction = make_auction(vec![]);
        auction.settlement_id = None;
        db.insert(auction.clone());
        let mut chain = chain_client();
        chain.expect_submit().never();
        let service = Service::new_with_mocks(db.clone(), chain);

        let err = service
            .place_bid(input(auction.id, PRODUCER_X, 90))
            .await
            .unwrap_err();
        assert!(matches!(err, RestError::InconsistentAuction(_)));
    }

    #[tokio::test]
    async fn test_place_bid_on_auction_concluded_during_chain_call() {
        let db = InMemoryDatabase::default();
        let auction = make_auction(vec![]);
        db.insert(auction.clone());
        let remote = db.clone();
        let auction_id = auction.id;
        let mut chain = chain_client();
        chain.expect_submit().returning(move |_| {
            remote.update(auction_id, |auction| {
                auction.status = entities::AuctionStatus::Expired;
            });
            Ok(receipt("BidPlaced", json!({"bidId": 1})))
        });
        let service = Service::new_with_mocks(db.clone(), chain);

        let err = service
            .place_bid(input(auction.id, PRODUCER_X, 90))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RestError::AuctionNotActive(entities::AuctionStatus::Expired)
        );
        assert!(db.get(auction.id).unwrap().bids.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_bids_are_both_kept() {
        let db = InMemoryDatabase::default();
        let auction = make_auction(vec![]);
        db.insert(auction.clone());
        let service = Service::new_with_mocks(db.clone(), accepting_chain());

        let (first, second) = tokio::join!(
            service.place_bid(input(auction.id, PRODUCER_X, 90)),
            service.place_bid(input(auction.id, PRODUCER_Y, 80)),
        );
        first.unwrap();
        second.unwrap();

        let stored = db.get(auction.id).unwrap();
        assert_eq!(stored.bids.len(), 2);
        let mut bidders: Vec<_> = stored.bids.iter().map(|bid| bid.bidder.clone()).collect();
        bidders.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(
            bidders,
            vec![Address::new(PRODUCER_X), Address::new(PRODUCER_Y)]
        );
    }

    #[tokio::test]
    async fn test_repeated_bids_from_same_bidder_coexist() {
        let db = InMemoryDatabase::default();
        let auction = make_auction(vec![]);
        db.insert(auction.clone());
        let service = Service::new_with_mocks(db.clone(), accepting_chain());

        service
            .place_bid(input(auction.id, PRODUCER_X, 90))
            .await
            .unwrap();
        let output = service
            .place_bid(input(auction.id, PRODUCER_X, 95))
            .await
            .unwrap();
        let prices: Vec<_> = output.auction.bids.iter().map(|bid| bid.unit_price).collect();
        assert_eq!(prices, vec![90, 95]);
    }
}
