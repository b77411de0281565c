use {
    super::repository::{
        Database,
        Repository,
    },
    std::sync::Arc,
};

pub mod get_display_names;
pub mod get_user;
pub mod get_user_by_token;

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);
impl std::ops::Deref for Service {
    type Target = ServiceInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct ServiceInner {
    repo: Repository,
}

impl Service {
    pub fn new(db: impl Database) -> Self {
        Self(Arc::new(ServiceInner {
            repo: Repository::new(db),
        }))
    }
}
