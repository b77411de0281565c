use {
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::{
        IntoParams,
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Auction,
    Listing,
    EnergyTransfer,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct Transaction {
    #[schema(value_type = String)]
    pub id:               Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub from:             String,
    pub to:               String,
    pub amount:           u64,
    pub price:            u64,
    /// Receipt id reported by the chain, or a synthesized unique reference.
    #[schema(example = "0x103d4fbd777a36311b5161f2062490f761f25b67406badb2bace62bb170aa4e3")]
    pub transaction_hash: String,
    pub status:           TransactionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp:        OffsetDateTime,
}

#[derive(Serialize, Deserialize, IntoParams, Clone, Debug)]
pub struct GetTransactionsQueryParams {
    /// Only return transactions sent or received by this address.
    #[param(example = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4")]
    pub address: Option<String>,
}
