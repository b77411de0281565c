use {
    crate::kernel::entities::Address,
    energy_market_api_types::user as api,
    std::collections::HashMap,
    time::OffsetDateTime,
};

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub address:       Address,
    pub name:          String,
    pub city:          Option<String>,
    pub latitude:      f64,
    pub longitude:     f64,
    pub is_producer:   bool,
    pub reputation:    i32,
    pub creation_time: OffsetDateTime,
}

/// Display names for a set of addresses, resolved in one lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayNames(HashMap<Address, String>);

impl DisplayNames {
    pub fn name_for(&self, address: &Address) -> String {
        self.0
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.to_string())
    }
}

impl FromIterator<User> for DisplayNames {
    fn from_iter<I: IntoIterator<Item = User>>(users: I) -> Self {
        Self(
            users
                .into_iter()
                .map(|user| (user.address, user.name))
                .collect(),
        )
    }
}

impl From<User> for api::User {
    fn from(user: User) -> Self {
        Self {
            address:     user.address.to_string(),
            name:        user.name,
            city:        user.city,
            latitude:    user.latitude,
            longitude:   user.longitude,
            is_producer: user.is_producer,
            reputation:  user.reputation,
        }
    }
}
