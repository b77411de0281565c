use {
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

pub mod auction;
pub mod transaction;
pub mod user;

#[derive(ToResponse, ToSchema, Serialize, Deserialize, Debug)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    /// Human readable summary of the failure.
    #[schema(example = "Auction is not active")]
    pub message: String,
    /// The underlying cause: the rejected detail, or the kind of failure when there is no detail.
    #[schema(example = "status: completed")]
    pub error:   String,
    /// The record of the attempt, returned when a chain submission failed after the auction was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction: Option<auction::Auction>,
}
