use {
    crate::kernel::entities::Address,
    energy_market_api_types::transaction as api,
    time::OffsetDateTime,
    uuid::Uuid,
};

pub type TransactionId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionType {
    Auction,
    Listing,
    EnergyTransfer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// A ledger record of one successful chain state change. Never mutated once written.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id:               TransactionId,
    pub transaction_type: TransactionType,
    pub from:             Address,
    pub to:               Address,
    pub amount:           u64,
    pub price:            u64,
    pub transaction_hash: String,
    pub status:           TransactionStatus,
    pub timestamp:        OffsetDateTime,
}

impl From<TransactionType> for api::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Auction => Self::Auction,
            TransactionType::Listing => Self::Listing,
            TransactionType::EnergyTransfer => Self::EnergyTransfer,
        }
    }
}

impl From<TransactionStatus> for api::TransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<Transaction> for api::Transaction {
    fn from(transaction: Transaction) -> Self {
        Self {
            id:               transaction.id,
            transaction_type: transaction.transaction_type.into(),
            from:             transaction.from.to_string(),
            to:               transaction.to.to_string(),
            amount:           transaction.amount,
            price:            transaction.price,
            transaction_hash: transaction.transaction_hash,
            status:           transaction.status.into(),
            timestamp:        transaction.timestamp,
        }
    }
}
