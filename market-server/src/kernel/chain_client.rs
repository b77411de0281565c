#[cfg(test)]
use mockall::automock;
use {
    super::{
        chain_receipt::ChainReceipt,
        entities::Address,
    },
    anyhow::{
        anyhow,
        Result,
    },
    axum::async_trait,
    axum_prometheus::metrics,
    serde::{
        Deserialize,
        Serialize,
    },
    serde_json::Value,
    std::{
        sync::atomic::{
            AtomicU64,
            Ordering,
        },
        time::{
            Duration,
            Instant,
        },
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum ChainMethod {
    CreateAuction,
    PlaceBid,
    SelectWinner,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChainCall {
    pub method: ChainMethod,
    pub args:   Vec<Value>,
    pub from:   Address,
}

/// Gateway to the market contract on the settlement chain.
///
/// A submission is attempted at most once; callers decide what a failure means.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    fn market_address(&self) -> Address;
    async fn submit(&self, call: ChainCall) -> Result<ChainReceipt>;
}

const SUBMIT_RPC_METHOD: &str = "market_submit";

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id:      u64,
    method:  &'static str,
    params:  [SubmitParams<'a>; 1],
}

#[derive(Serialize)]
struct SubmitParams<'a> {
    contract: &'a str,
    method:   &'a str,
    args:     &'a [Value],
    from:     &'a str,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error:  Option<Value>,
}

#[derive(Debug)]
pub struct HttpChainClient {
    client:          reqwest::Client,
    url:             reqwest::Url,
    market_contract: Address,
    request_id:      AtomicU64,
}

impl HttpChainClient {
    pub fn new(url: &str, market_contract: Address, timeout: Duration) -> Result<Self> {
        let url = reqwest::Url::parse(url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            market_contract,
            request_id: AtomicU64::new(1),
        })
    }

    async fn send(&self, call: &ChainCall) -> Result<ChainReceipt> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id:      self.request_id.fetch_add(1, Ordering::Relaxed),
            method:  SUBMIT_RPC_METHOD,
            params:  [SubmitParams {
                contract: self.market_contract.as_str(),
                method:   call.method.as_ref(),
                args:     &call.args,
                from:     call.from.as_str(),
            }],
        };
        let response: JsonRpcResponse = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.error, response.result) {
            (Some(error), _) if !error.is_null() => {
                Err(anyhow!("Chain rejected {}: {}", call.method, error))
            }
            (_, Some(result)) => Ok(ChainReceipt::from_json(&result)),
            _ => Err(anyhow!("Chain returned no result for {}", call.method)),
        }
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    fn market_address(&self) -> Address {
        self.market_contract.clone()
    }

    async fn submit(&self, call: ChainCall) -> Result<ChainReceipt> {
        let start = Instant::now();
        let res = self.send(&call).await;

        let result_label = match &res {
            Ok(_) => "success",
            Err(_) => "error",
        };
        let labels = [
            ("method", call.method.to_string()),
            ("result", result_label.to_string()),
        ];
        let latency = start.elapsed().as_secs_f64();
        metrics::counter!("chain_requests_total", &labels).increment(1);
        metrics::histogram!("chain_requests_duration_seconds", &labels).record(latency);
        res
    }
}
