use {
    crate::{
        api::start_api,
        auction::service::{
            self as auction_service,
            workers::ExpirationWorker,
        },
        config::{
            Config,
            RunOptions,
        },
        kernel::chain_client::HttpChainClient,
        per_metrics::start_metrics,
        state::Store,
        transaction::service as transaction_service,
        user::service as user_service,
    },
    anyhow::anyhow,
    axum_prometheus::metrics_exporter_prometheus::PrometheusBuilder,
    sqlx::postgres::PgPoolOptions,
    std::sync::Arc,
    tokio_util::{
        sync::CancellationToken,
        task::TaskTracker,
    },
};

const DB_MAX_CONNECTIONS: u32 = 10;

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            tracing::info!("Registered shutdown signal handler...");
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?err, "Failed to listen for the shutdown signal");
            }
            tracing::info!("Shut down signal received, waiting for tasks...");
            shutdown.cancel();
        }
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .connect(&run_options.server.database_url)
        .await
        .map_err(|err| anyhow!("Failed to connect to the database: {:?}", err))?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|err| anyhow!("Failed to run migrations: {:?}", err))?;

    let chain_client = HttpChainClient::new(
        &config.chain.rpc_addr,
        config.chain.market_contract.clone(),
        config.chain.rpc_timeout,
    )?;
    tracing::info!(
        rpc_addr = config.chain.rpc_addr,
        market_contract = %config.chain.market_contract,
        "Using chain gateway"
    );

    let user_service = user_service::Service::new(pool.clone());
    let transaction_service = transaction_service::Service::new(pool.clone());
    let auction_service = auction_service::Service::new(
        pool,
        Arc::new(chain_client),
        user_service.clone(),
        transaction_service.clone(),
        auction_service::Config {
            chain_timeout: config.chain.rpc_timeout,
        },
    );

    let metrics_recorder = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| anyhow!("Failed to install the metrics recorder: {:?}", err))?;
    let store = Arc::new(Store {
        auction_service: auction_service.clone(),
        user_service,
        transaction_service,
        metrics_recorder,
    });

    let task_tracker = TaskTracker::new();
    let expiration_worker = ExpirationWorker::new(
        auction_service,
        config.auction.expiration_sweep_interval,
    )
    .start(&task_tracker, shutdown.clone());

    // Either server stopping brings the rest of the process down with it.
    let (api_result, metrics_result) = tokio::join!(
        async {
            let result = start_api(run_options.clone(), store.clone(), shutdown.clone()).await;
            shutdown.cancel();
            result
        },
        async {
            let result = start_metrics(run_options.clone(), store.clone(), shutdown.clone()).await;
            shutdown.cancel();
            result
        },
    );
    expiration_worker.stop();
    task_tracker.close();
    task_tracker.wait().await;

    api_result?;
    metrics_result?;
    Ok(())
}
