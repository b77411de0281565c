use {
    super::Service,
    crate::{
        kernel::entities::Address,
        user::entities,
    },
    std::collections::BTreeSet,
};

pub struct GetDisplayNamesInput {
    pub addresses: Vec<Address>,
}

impl Service {
    /// Resolves display names for all addresses with a single lookup.
    ///
    /// A failed lookup is logged and yields no names, so callers fall back to raw addresses.
    pub async fn get_display_names(&self, input: GetDisplayNamesInput) -> entities::DisplayNames {
        let addresses: Vec<Address> = input
            .addresses
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        match self.repo.get_users(&addresses).await {
            Ok(users) => users.into_iter().collect(),
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to resolve display names");
                entities::DisplayNames::default()
            }
        }
    }
}
