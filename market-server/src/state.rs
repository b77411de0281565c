use {
    crate::{
        auction::service as auction_service,
        transaction::service as transaction_service,
        user::service as user_service,
    },
    axum_prometheus::metrics_exporter_prometheus::PrometheusHandle,
};

pub struct Store {
    pub auction_service:     auction_service::Service,
    pub user_service:        user_service::Service,
    pub transaction_service: transaction_service::Service,
    pub metrics_recorder:    PrometheusHandle,
}
