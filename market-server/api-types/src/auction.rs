use {
    crate::transaction::Transaction,
    serde::{
        Deserialize,
        Serialize,
    },
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type AuctionId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    /// The auction is stored but not yet accepted by the chain.
    Pending,
    /// The auction is accepted by the chain and open for bids.
    Active,
    /// A winner was selected and settled on chain.
    Completed,
    /// The auction ended without a successful settlement.
    Expired,
    /// The auction ended without any bids.
    Cancelled,
    /// The chain rejected the auction at creation.
    Failed,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionMethod {
    Manual,
    Automatic,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, PartialEq, Debug)]
pub struct Bid {
    /// Address of the producer who placed the bid.
    #[schema(example = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4")]
    pub bidder:          String,
    /// Display name of the bidder, or the address when the bidder is unknown.
    pub bidder_name:     String,
    /// Offered price per unit of energy.
    #[schema(example = 80)]
    pub unit_price:      u64,
    #[serde(with = "time::serde::rfc3339")]
    pub submission_time: OffsetDateTime,
    /// Bid identifier assigned by the chain, when it reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_bid_id:    Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, PartialEq, Debug)]
pub struct Auction {
    /// The internal record id.
    #[schema(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:                AuctionId,
    /// The id assigned by the chain once the auction was accepted.
    #[schema(example = "7")]
    pub settlement_id:     Option<String>,
    #[schema(example = "0xab8483f64d9c6d1ecf9b849ae677dd3315835cb2")]
    pub buyer:             String,
    pub buyer_name:        String,
    /// Requested amount of energy.
    #[schema(example = 10)]
    pub amount:            u64,
    /// Highest unit price the buyer accepts.
    #[schema(example = 100)]
    pub max_unit_price:    u64,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time:          OffsetDateTime,
    pub status:            AuctionStatus,
    pub bids:              Vec<Bid>,
    pub winner:            Option<String>,
    pub final_price:       Option<u64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completion_time:   Option<OffsetDateTime>,
    pub completion_method: Option<CompletionMethod>,
    pub city:              Option<String>,
    pub latitude:          Option<f64>,
    pub longitude:         Option<f64>,
    /// Human readable location, empty when the buyer has no complete location.
    #[schema(example = "Lyon (45.76, 4.83)")]
    pub location:          String,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_time:     OffsetDateTime,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct AuctionCreate {
    /// Address of the consumer opening the auction. Defaults to the authenticated user.
    #[serde(default)]
    #[schema(example = "0xab8483f64d9c6d1ecf9b849ae677dd3315835cb2")]
    pub buyer:          Option<String>,
    #[schema(example = 10)]
    pub amount:         u64,
    #[serde(alias = "maxBasePrice")]
    #[schema(example = 100)]
    pub max_unit_price: u64,
    /// Auction duration in seconds.
    #[schema(example = 3600)]
    pub duration:       u64,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct AuctionCreateResult {
    pub auction:     Auction,
    pub transaction: Transaction,
    /// The settlement id assigned by the chain.
    #[schema(example = "7")]
    pub auction_id:  String,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct BidCreate {
    /// Address of the producer bidding. Defaults to the authenticated user.
    #[serde(default)]
    #[schema(example = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4")]
    pub bidder:     Option<String>,
    #[serde(alias = "basePrice")]
    #[schema(example = 80)]
    pub unit_price: u64,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct BidResult {
    pub auction:     Auction,
    pub transaction: Transaction,
    pub bid_id:      Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
pub struct AuctionComplete {
    /// Defaults to the authenticated user.
    #[serde(default)]
    #[schema(example = "0xab8483f64d9c6d1ecf9b849ae677dd3315835cb2")]
    pub buyer: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug)]
pub struct AuctionCompleteResult {
    pub auction:     Auction,
    /// Absent when the auction was cancelled for lack of bids.
    pub transaction: Option<Transaction>,
    pub winner:      Option<String>,
    pub final_price: Option<u64>,
}
