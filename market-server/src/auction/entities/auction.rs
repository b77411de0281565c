use {
    super::Bid,
    crate::{
        kernel::entities::Address,
        user::entities::{
            DisplayNames,
            User,
        },
    },
    energy_market_api_types::auction as api,
    std::{
        fmt,
        sync::Arc,
    },
    time::{
        Duration,
        OffsetDateTime,
    },
    tokio::sync::Mutex,
    uuid::Uuid,
};

pub type AuctionId = Uuid;
pub type SettlementId = String;
pub type AuctionLock = Arc<Mutex<()>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionStatus {
    Pending,
    Active,
    Completed,
    Expired,
    Cancelled,
    Failed,
}

impl AuctionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Active)
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(status)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionMethod {
    Manual,
    Automatic,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuctionLocation {
    pub city:      Option<String>,
    pub latitude:  Option<f64>,
    pub longitude: Option<f64>,
}

impl AuctionLocation {
    /// `"{city} ({latitude}, {longitude})"`, or empty unless all three parts are known.
    pub fn display(&self) -> String {
        match (&self.city, self.latitude, self.longitude) {
            (Some(city), Some(latitude), Some(longitude)) => {
                format!("{} ({}, {})", city, latitude, longitude)
            }
            _ => String::new(),
        }
    }
}

impl From<&User> for AuctionLocation {
    fn from(user: &User) -> Self {
        Self {
            city:      user.city.clone(),
            latitude:  Some(user.latitude),
            longitude: Some(user.longitude),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Auction {
    pub id:                AuctionId,
    pub settlement_id:     Option<SettlementId>,
    pub buyer:             Address,
    pub amount:            u64,
    pub max_unit_price:    u64,
    pub end_time:          OffsetDateTime,
    pub status:            AuctionStatus,
    pub bids:              Vec<Bid>,
    pub winner:            Option<Address>,
    pub final_price:       Option<u64>,
    pub completion_time:   Option<OffsetDateTime>,
    pub completion_method: Option<CompletionMethod>,
    pub location:          AuctionLocation,
    pub creation_time:     OffsetDateTime,
}

/// The only transitions out of `Active`.
#[derive(Clone, Debug, PartialEq)]
pub enum AuctionConclusion {
    Completed {
        winner:      Address,
        final_price: u64,
        method:      CompletionMethod,
    },
    Cancelled {
        method: Option<CompletionMethod>,
    },
    Expired,
}

impl AuctionConclusion {
    pub fn status(&self) -> AuctionStatus {
        match self {
            Self::Completed { .. } => AuctionStatus::Completed,
            Self::Cancelled { .. } => AuctionStatus::Cancelled,
            Self::Expired => AuctionStatus::Expired,
        }
    }
}

impl Auction {
    /// Returns `None` when the end time is out of range.
    pub fn new_pending(
        buyer: Address,
        amount: u64,
        max_unit_price: u64,
        duration: Duration,
        location: AuctionLocation,
    ) -> Option<Self> {
        let creation_time = OffsetDateTime::now_utc();
        Some(Self {
            id: Uuid::new_v4(),
            settlement_id: None,
            buyer,
            amount,
            max_unit_price,
            end_time: creation_time.checked_add(duration)?,
            status: AuctionStatus::Pending,
            bids: vec![],
            winner: None,
            final_price: None,
            completion_time: None,
            completion_method: None,
            location,
            creation_time,
        })
    }

    /// Lowest unit price wins; among equal prices the earliest bid wins.
    pub fn winning_bid(&self) -> Option<&Bid> {
        self.bids.iter().reduce(|best, bid| {
            if bid.unit_price < best.unit_price {
                bid
            } else {
                best
            }
        })
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.end_time <= now
    }

    /// Every address a response for this auction displays.
    pub fn addresses(&self) -> Vec<Address> {
        std::iter::once(self.buyer.clone())
            .chain(self.bids.iter().map(|bid| bid.bidder.clone()))
            .chain(self.winner.clone())
            .collect()
    }

    pub fn to_api(&self, names: &DisplayNames) -> api::Auction {
        api::Auction {
            id:                self.id,
            settlement_id:     self.settlement_id.clone(),
            buyer:             self.buyer.to_string(),
            buyer_name:        names.name_for(&self.buyer),
            amount:            self.amount,
            max_unit_price:    self.max_unit_price,
            end_time:          self.end_time,
            status:            self.status.into(),
            bids:              self.bids.iter().map(|bid| bid.to_api(names)).collect(),
            winner:            self.winner.as_ref().map(ToString::to_string),
            final_price:       self.final_price,
            completion_time:   self.completion_time,
            completion_method: self.completion_method.map(Into::into),
            city:              self.location.city.clone(),
            latitude:          self.location.latitude,
            longitude:         self.location.longitude,
            location:          self.location.display(),
            creation_time:     self.creation_time,
        }
    }
}

impl From<AuctionStatus> for api::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Pending => Self::Pending,
            AuctionStatus::Active => Self::Active,
            AuctionStatus::Completed => Self::Completed,
            AuctionStatus::Expired => Self::Expired,
            AuctionStatus::Cancelled => Self::Cancelled,
            AuctionStatus::Failed => Self::Failed,
        }
    }
}

impl From<CompletionMethod> for api::CompletionMethod {
    fn from(method: CompletionMethod) -> Self {
        match method {
            CompletionMethod::Manual => Self::Manual,
            CompletionMethod::Automatic => Self::Automatic,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::user::entities::tests::make_user,
    };

    pub fn make_bid(bidder: &str, unit_price: u64) -> Bid {
        Bid {
            bidder: Address::new(bidder),
            unit_price,
            submission_time: OffsetDateTime::now_utc(),
            chain_bid_id: None,
        }
    }

    pub fn make_auction(bids: Vec<Bid>) -> Auction {
        let mut auction = Auction::new_pending(
            Address::new("0xbuyer"),
            10,
            100,
            Duration::hours(1),
            AuctionLocation::default(),
        )
        .unwrap();
        auction.status = AuctionStatus::Active;
        auction.settlement_id = Some("7".to_string());
        auction.bids = bids;
        auction
    }

    #[test]
    fn test_winning_bid_is_lowest_price() {
        let auction = make_auction(vec![
            make_bid("0xp1", 90),
            make_bid("0xp2", 70),
            make_bid("0xp3", 80),
        ]);
        assert_eq!(auction.winning_bid().unwrap().bidder, Address::new("0xp2"));
    }

    #[test]
    fn test_winning_bid_tie_goes_to_earliest() {
        let auction = make_auction(vec![
            make_bid("0xp1", 90),
            make_bid("0xp2", 70),
            make_bid("0xp3", 70),
        ]);
        assert_eq!(auction.winning_bid().unwrap().bidder, Address::new("0xp2"));
    }

    #[test]
    fn test_winning_bid_without_bids() {
        assert_eq!(make_auction(vec![]).winning_bid(), None);
    }

    #[test]
    fn test_location_display() {
        let user = make_user("0xbuyer", "Bob", false);
        assert_eq!(AuctionLocation::from(&user).display(), "Lyon (45.76, 4.83)");

        let location = AuctionLocation {
            city:      Some("Nantes".to_string()),
            latitude:  Some(47.0),
            longitude: Some(-1.5),
        };
        assert_eq!(location.display(), "Nantes (47, -1.5)");

        let location = AuctionLocation {
            city:      None,
            latitude:  Some(47.0),
            longitude: Some(-1.5),
        };
        assert_eq!(location.display(), "");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!AuctionStatus::Pending.is_terminal());
        assert!(!AuctionStatus::Active.is_terminal());
        assert!(AuctionStatus::Completed.is_terminal());
        assert!(AuctionStatus::Expired.is_terminal());
        assert!(AuctionStatus::Cancelled.is_terminal());
        assert!(AuctionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_to_api_resolves_names() {
        let mut auction = make_auction(vec![make_bid("0xp1", 90)]);
        auction.winner = Some(Address::new("0xp1"));
        let names: DisplayNames = vec![make_user("0xp1", "Paula", true)].into_iter().collect();

        let api_auction = auction.to_api(&names);
        assert_eq!(api_auction.buyer_name, "0xbuyer");
        assert_eq!(api_auction.bids[0].bidder_name, "Paula");
        assert_eq!(api_auction.winner.as_deref(), Some("0xp1"));
        assert_eq!(api_auction.status, api::AuctionStatus::Active);
        assert_eq!(auction.addresses().len(), 3);
    }
}
