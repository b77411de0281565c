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
            chain_receipt::ChainReceipt,
            entities::Address,
        },
        transaction::{
            entities::{
                Transaction,
                TransactionType,
            },
            service::record_transaction::RecordTransactionInput,
        },
        user::{
            entities::DisplayNames,
            service::get_user::GetUserInput,
        },
    },
    anyhow::anyhow,
    serde_json::json,
    time::Duration,
};

const AUCTION_CREATED_EVENT: &str = "AuctionCreated";
const AUCTION_ID_ARG: &str = "auctionId";

pub struct CreateAuctionInput {
    pub buyer:          Address,
    pub amount:         u64,
    pub max_unit_price: u64,
    /// Duration in seconds.
    pub duration:       u64,
}

#[derive(Debug, Clone)]
pub struct CreateAuctionOutput {
    pub auction:       entities::Auction,
    pub transaction:   Transaction,
    pub settlement_id: entities::SettlementId,
}

impl CreateAuctionInput {
    fn validate(&self) -> Result<(), RestError> {
        if self.buyer.is_empty() {
            return Err(RestError::BadParameters("buyer is required".to_string()));
        }
        if self.amount == 0 {
            return Err(RestError::BadParameters(
                "amount must be positive".to_string(),
            ));
        }
        if self.max_unit_price == 0 {
            return Err(RestError::BadParameters(
                "max unit price must be positive".to_string(),
            ));
        }
        if self.duration == 0 {
            return Err(RestError::BadParameters(
                "duration must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn extract_settlement_id(receipt: &ChainReceipt) -> anyhow::Result<entities::SettlementId> {
    receipt
        .event_arg(AUCTION_CREATED_EVENT, AUCTION_ID_ARG)
        .ok_or_else(|| anyhow!("{} event carried no {}", AUCTION_CREATED_EVENT, AUCTION_ID_ARG))
}

impl Service {
    /// Opens an auction for a consumer.
    ///
    /// The auction is stored as pending before the chain sees it, so every attempt leaves a
    /// record: active when the chain accepts it, failed otherwise.
    #[tracing::instrument(skip_all, fields(buyer = %input.buyer, auction_id))]
    pub async fn create_auction(
        &self,
        input: CreateAuctionInput,
    ) -> Result<CreateAuctionOutput, RestError> {
        input.validate()?;
        let buyer = self
            .user_service
            .get_user(GetUserInput {
                address: input.buyer.clone(),
            })
            .await?
            .ok_or(RestError::UserNotFound)?;
        if buyer.is_producer {
            return Err(RestError::Forbidden(
                "Only consumers can create auctions".to_string(),
            ));
        }
        let duration = i64::try_from(input.duration)
            .map(Duration::seconds)
            .map_err(|_| RestError::BadParameters("duration is too large".to_string()))?;
        let auction = entities::Auction::new_pending(
            buyer.address.clone(),
            input.amount,
            input.max_unit_price,
            duration,
            entities::AuctionLocation::from(&buyer),
        )
        .ok_or_else(|| RestError::BadParameters("duration is too large".to_string()))?;
        tracing::Span::current().record("auction_id", auction.id.to_string());
        self.repo.add_auction(&auction).await?;

        let submission = self
            .submit_to_chain(ChainCall {
                method: ChainMethod::CreateAuction,
                args:   vec![
                    json!(input.amount),
                    json!(input.max_unit_price),
                    json!(input.duration),
                ],
                from:   buyer.address.clone(),
            })
            .await
            .and_then(|receipt| Ok((extract_settlement_id(&receipt)?, receipt)));
        let (settlement_id, receipt) = match submission {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = ?err, "Chain rejected auction creation");
                let auction = self.fail_pending_auction(auction).await;
                let names: DisplayNames = std::iter::once(buyer).collect();
                return Err(RestError::ChainSubmissionFailed {
                    reason:  err.to_string(),
                    auction: Some(Box::new(auction.to_api(&names))),
                });
            }
        };

        let auction = match self.repo.activate_auction(auction.id, &settlement_id).await {
            Ok(Some(auction)) => auction,
            Ok(None) => {
                tracing::error!(settlement_id, "Auction left pending state during creation");
                return Err(RestError::InconsistentAuction(
                    "auction left pending state during creation".to_string(),
                ));
            }
            Err(err) => {
                // The chain holds an auction under this settlement id that the store never saw.
                tracing::error!(settlement_id, "Failed to activate auction accepted by the chain");
                self.fail_pending_auction(auction).await;
                return Err(err);
            }
        };
        tracing::info!(settlement_id, "Auction is active");

        let transaction = self
            .transaction_service
            .record_transaction(RecordTransactionInput {
                transaction_type: TransactionType::Auction,
                reference:        auction.id.to_string(),
                from:             auction.buyer.clone(),
                to:               self.chain_client.market_address(),
                amount:           auction.amount,
                price:            auction.max_unit_price,
                receipt_id:       receipt.receipt_id,
            })
            .await?;

        Ok(CreateAuctionOutput {
            auction,
            transaction,
            settlement_id,
        })
    }

    async fn fail_pending_auction(&self, auction: entities::Auction) -> entities::Auction {
        match self.repo.fail_auction(auction.id).await {
            Ok(Some(failed)) => failed,
            Ok(None) => {
                tracing::error!(auction_id = %auction.id, "Auction left pending state before it could be marked failed");
                auction
            }
            Err(err) => {
                tracing::error!(auction_id = %auction.id, error = ?err, "Failed to mark auction as failed");
                auction
            }
        }
    }
}
