use {
    super::Service,
    crate::{
        auction::entities,
        user::{
            entities::DisplayNames,
            service::get_display_names::GetDisplayNamesInput,
        },
    },
    energy_market_api_types::auction as api,
};

impl Service {
    /// Resolves the names of every buyer, bidder and winner of the auctions in one lookup.
    pub async fn get_display_names(&self, auctions: &[entities::Auction]) -> DisplayNames {
        let addresses = auctions.iter().flat_map(entities::Auction::addresses).collect();
        self.user_service
            .get_display_names(GetDisplayNamesInput { addresses })
            .await
    }

    pub async fn enrich_auctions(&self, auctions: &[entities::Auction]) -> Vec<api::Auction> {
        let names = self.get_display_names(auctions).await;
        auctions
            .iter()
            .map(|auction| auction.to_api(&names))
            .collect()
    }

    pub async fn enrich_auction(&self, auction: &entities::Auction) -> api::Auction {
        let names = self.get_display_names(std::slice::from_ref(auction)).await;
        auction.to_api(&names)
    }
}
