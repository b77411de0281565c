use {
    super::repository::{
        Database,
        Repository,
    },
    crate::{
        kernel::chain_client::ChainClient,
        transaction::service as transaction_service,
        user::service as user_service,
    },
    std::{
        sync::Arc,
        time::Duration,
    },
};

pub mod complete_auction;
pub mod create_auction;
pub mod get_active_auctions;
pub mod get_auction;
pub mod get_concluded_auctions;
pub mod get_display_names;
pub mod place_bid;
pub mod sweep_expired_auctions;
pub mod workers;

mod conclude_auction;
mod submit_to_chain;

#[derive(Clone, Debug)]
pub struct Config {
    /// Upper bound on a single chain submission, including the gateway round trip.
    pub chain_timeout: Duration,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct ServiceInner {
    repo:                Repository,
    chain_client:        Arc<dyn ChainClient>,
    user_service:        user_service::Service,
    transaction_service: transaction_service::Service,
    config:              Config,
}

impl Service {
    pub fn new(
        db: impl Database,
        chain_client: Arc<dyn ChainClient>,
        user_service: user_service::Service,
        transaction_service: transaction_service::Service,
        config: Config,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Repository::new(db),
            chain_client,
            user_service,
            transaction_service,
            config,
        }))
    }
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::{
            kernel::{
                chain_client::MockChainClient,
                chain_receipt::ChainReceipt,
                entities::Address,
            },
            transaction::repository::MockDatabase as MockTransactionDatabase,
            user::{
                entities::{
                    tests::make_user,
                    User,
                },
                repository::MockDatabase as MockUserDatabase,
            },
        },
        serde_json::{
            json,
            Value,
        },
        uuid::Uuid,
    };

    pub const BUYER: &str = "0xbuyer";
    pub const PRODUCER_X: &str = "0xproducerx";
    pub const PRODUCER_Y: &str = "0xproducery";
    pub const MARKET: &str = "0xmarket";

    pub fn default_users() -> Vec<User> {
        vec![
            make_user(BUYER, "Bob", false),
            make_user(PRODUCER_X, "Xena", true),
            make_user(PRODUCER_Y, "Yann", true),
        ]
    }

    /// A receipt in the logs shape, with a fresh receipt id.
    pub fn receipt(event: &str, args: Value) -> ChainReceipt {
        ChainReceipt::from_json(&json!({
            "tx": format!("0x{}", Uuid::new_v4().simple()),
            "logs": [{"event": event, "args": args}],
        }))
    }

    pub fn chain_client() -> MockChainClient {
        let mut chain_client = MockChainClient::new();
        chain_client
            .expect_market_address()
            .returning(|| Address::new(MARKET));
        chain_client
    }

    fn user_service(users: Vec<User>) -> user_service::Service {
        let mut db = MockUserDatabase::new();
        let lookup = users.clone();
        db.expect_get_user().returning(move |address| {
            Ok(lookup.iter().find(|user| &user.address == address).cloned())
        });
        db.expect_get_users().returning(move |addresses| {
            Ok(users
                .iter()
                .filter(|user| addresses.contains(&user.address))
                .cloned()
                .collect())
        });
        user_service::Service::new(db)
    }

    fn transaction_service() -> transaction_service::Service {
        let mut db = MockTransactionDatabase::new();
        db.expect_add_transaction().returning(|_| Ok(()));
        transaction_service::Service::new(db)
    }

    impl Service {
        pub fn new_with_mocks(db: impl Database, chain_client: MockChainClient) -> Self {
            Self::new_with_users(db, chain_client, default_users())
        }

        pub fn new_with_chain_client(
            db: impl Database,
            chain_client: Arc<dyn ChainClient>,
        ) -> Self {
            Service::new(
                db,
                chain_client,
                user_service(default_users()),
                transaction_service(),
                Config {
                    chain_timeout: Duration::from_millis(200),
                },
            )
        }

        pub fn new_with_users(
            db: impl Database,
            chain_client: MockChainClient,
            users: Vec<User>,
        ) -> Self {
            Service::new(
                db,
                Arc::new(chain_client),
                user_service(users),
                transaction_service(),
                Config {
                    chain_timeout: Duration::from_millis(200),
                },
            )
        }
    }
}
