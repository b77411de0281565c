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
};

pub struct CompleteAuctionInput {
    pub auction_id: entities::AuctionId,
    /// Caller of the chain completion.
    pub buyer:      Address,
    pub trigger:    entities::CompletionMethod,
}

#[derive(Debug, Clone)]
pub struct CompleteAuctionOutput {
    pub auction:     entities::Auction,
    pub transaction: Option<Transaction>,
    pub winner:      Option<Address>,
    pub final_price: Option<u64>,
}

impl Service {
    /// Concludes an auction the caller already holds the lock of.
    ///
    /// With no bids the auction is cancelled without touching the chain. Otherwise the lowest bid
    /// is settled on chain. A failed settlement leaves a manually completed auction active, while
    /// an automatic completion falls back to expired.
    pub(super) async fn complete_locked(
        &self,
        auction: entities::Auction,
        buyer: Address,
        trigger: entities::CompletionMethod,
    ) -> Result<CompleteAuctionOutput, RestError> {
        let winning_bid = match auction.winning_bid() {
            Some(bid) => bid.clone(),
            None => {
                let auction = self
                    .conclude_auction(
                        &auction,
                        entities::AuctionConclusion::Cancelled {
                            method: Some(trigger),
                        },
                    )
                    .await?;
                tracing::info!("Auction cancelled without bids");
                return Ok(CompleteAuctionOutput {
                    auction,
                    transaction: None,
                    winner: None,
                    final_price: None,
                });
            }
        };
        let settlement_id = auction.settlement_id.clone().ok_or_else(|| {
            tracing::error!("Active auction has no settlement id");
            RestError::InconsistentAuction("active auction has no settlement id".to_string())
        })?;

        let receipt = match self
            .submit_to_chain(ChainCall {
                method: ChainMethod::SelectWinner,
                args:   vec![json!(settlement_id)],
                from:   buyer,
            })
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::warn!(error = ?err, trigger = ?trigger, "Chain rejected auction completion");
                let auction = match trigger {
                    entities::CompletionMethod::Manual => None,
                    entities::CompletionMethod::Automatic => Some(
                        self.conclude_auction(&auction, entities::AuctionConclusion::Expired)
                            .await?,
                    ),
                };
                return Err(RestError::ChainSubmissionFailed {
                    reason:  err.to_string(),
                    auction: match auction {
                        Some(auction) => Some(Box::new(self.enrich_auction(&auction).await)),
                        None => None,
                    },
                });
            }
        };

        let auction = self
            .conclude_auction(
                &auction,
                entities::AuctionConclusion::Completed {
                    winner:      winning_bid.bidder.clone(),
                    final_price: winning_bid.unit_price,
                    method:      trigger,
                },
            )
            .await?;
        tracing::info!(winner = %winning_bid.bidder, final_price = winning_bid.unit_price, "Auction completed");

        let transaction = self
            .transaction_service
            .record_transaction(RecordTransactionInput {
                transaction_type: TransactionType::Auction,
                reference:        auction.id.to_string(),
                from:             auction.buyer.clone(),
                to:               winning_bid.bidder.clone(),
                amount:           auction.amount,
                price:            winning_bid.unit_price,
                receipt_id:       receipt.receipt_id,
            })
            .await?;

        Ok(CompleteAuctionOutput {
            auction,
            transaction: Some(transaction),
            winner: Some(winning_bid.bidder),
            final_price: Some(winning_bid.unit_price),
        })
    }

    async fn complete_auction_for_lock(
        &self,
        input: CompleteAuctionInput,
        lock: entities::AuctionLock,
    ) -> Result<CompleteAuctionOutput, RestError> {
        let _lock = lock.lock().await;
        let auction = self
            .repo
            .get_auction(input.auction_id)
            .await?
            .ok_or(RestError::AuctionNotFound)?;
        if auction.status != entities::AuctionStatus::Active {
            return Err(RestError::AuctionNotActive(auction.status));
        }
        self.complete_locked(auction, input.buyer, input.trigger)
            .await
    }

    #[tracing::instrument(skip_all, fields(auction_id = %input.auction_id, trigger = ?input.trigger))]
    pub async fn complete_auction(
        &self,
        input: CompleteAuctionInput,
    ) -> Result<CompleteAuctionOutput, RestError> {
        let auction_id = input.auction_id;
        let lock = self
            .repo
            .get_or_create_in_memory_auction_lock(auction_id)
            .await;
        let result = self.complete_auction_for_lock(input, lock).await;
        self.repo.remove_in_memory_auction_lock(&auction_id).await;
        result
    }
}
