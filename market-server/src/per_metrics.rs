use {
    crate::{
        config::RunOptions,
        state::Store,
    },
    anyhow::Result,
    axum::{
        routing::get,
        Router,
    },
    axum_prometheus::{
        metrics,
        PrometheusMetricLayerBuilder,
    },
    std::{
        fmt::Debug,
        sync::Arc,
        time::Instant,
    },
    tokio_util::sync::CancellationToken,
    tracing::{
        field::{
            Field,
            Visit,
        },
        span::{
            Attributes,
            Record,
        },
        Id,
        Metadata,
    },
    tracing_subscriber::{
        layer::Context,
        registry::LookupSpan,
        Layer,
    },
};

pub const AUCTION_SWEEP_CONCLUDED: &str = "auction_sweep_concluded";
pub const AUCTION_SWEEP_DURATION: &str = "auction_sweep_duration_seconds";

/// Timing and labels collected for a span opened with `target = "metrics"`.
#[derive(Debug, Clone)]
struct SpanMetrics {
    category:   String,
    name:       String,
    result:     String,
    started_at: Instant,
}

impl SpanMetrics {
    fn new(name: &str) -> Self {
        Self {
            category:   "unknown".to_string(),
            name:       name.to_string(),
            result:     "unknown".to_string(),
            started_at: Instant::now(),
        }
    }

    fn set(&mut self, field: &str, value: String) {
        match field {
            "category" => self.category = value,
            "name" => self.name = value,
            "result" => self.result = value,
            _ => {}
        }
    }
}

impl Visit for SpanMetrics {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "result" {
            self.set("result", format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field.name(), value.to_string());
    }
}

pub fn is_metrics(metadata: &Metadata, check_tracing_enabled: bool) -> bool {
    let tracing_check = !check_tracing_enabled
        || metadata
            .fields()
            .iter()
            .any(|f| f.name() == "tracing_enabled");
    tracing_check && metadata.target().starts_with("metrics")
}

/// Turns every metrics span into a `{category}_total` counter and a
/// `{category}_duration_seconds` histogram, labelled by name and result.
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer
where
    S: tracing::Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            tracing::error!("span not found: {:?}", id);
            return;
        };
        if !is_metrics(span.metadata(), false) {
            return;
        }
        let mut data = SpanMetrics::new(span.metadata().name());
        attrs.record(&mut data);
        span.extensions_mut().replace(data);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            tracing::error!("span not found: {:?}", id);
            return;
        };
        if let Some(data) = span.extensions_mut().get_mut::<SpanMetrics>() {
            values.record(data);
        };
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            tracing::error!("span not found: {:?}", id);
            return;
        };
        if let Some(data) = span.extensions().get::<SpanMetrics>() {
            let latency = data.started_at.elapsed().as_secs_f64();
            let labels = [("name", data.name.clone()), ("result", data.result.clone())];
            metrics::histogram!(format!("{}_duration_seconds", data.category), &labels)
                .record(latency);
            metrics::counter!(format!("{}_total", data.category), &labels).increment(1);
        };
    }
}

pub async fn start_metrics(
    run_options: RunOptions,
    store: Arc<Store>,
    shutdown: CancellationToken,
) -> Result<()> {
    tracing::info!("Starting Metrics Server...");

    let (_, metric_handle) = PrometheusMetricLayerBuilder::new()
        .with_metrics_from_fn(|| store.metrics_recorder.clone())
        .build_pair();
    let app = Router::new().route("/metrics", get(|| async move { metric_handle.render() }));

    let listener = tokio::net::TcpListener::bind(&run_options.server.metrics_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("Shutting down metrics server...");
        })
        .await?;
    Ok(())
}
