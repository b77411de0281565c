use {
    crate::{
        kernel::entities::Address,
        user::entities::DisplayNames,
    },
    energy_market_api_types::auction as api,
    time::OffsetDateTime,
};

/// A producer's offer on an auction. Bids are append-only and kept in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct Bid {
    pub bidder:          Address,
    pub unit_price:      u64,
    pub submission_time: OffsetDateTime,
    pub chain_bid_id:    Option<String>,
}

impl Bid {
    pub fn to_api(&self, names: &DisplayNames) -> api::Bid {
        api::Bid {
            bidder:          self.bidder.to_string(),
            bidder_name:     names.name_for(&self.bidder),
            unit_price:      self.unit_price,
            submission_time: self.submission_time,
            chain_bid_id:    self.chain_bid_id.clone(),
        }
    }
}
