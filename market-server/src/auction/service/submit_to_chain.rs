use {
    super::Service,
    crate::kernel::{
        chain_client::ChainCall,
        chain_receipt::ChainReceipt,
    },
    anyhow::{
        anyhow,
        Result,
    },
};

impl Service {
    /// Submits once; a call that outlives the configured timeout counts as failed.
    pub(super) async fn submit_to_chain(&self, call: ChainCall) -> Result<ChainReceipt> {
        let method = call.method;
        let timeout = self.config.chain_timeout;
        match tokio::time::timeout(timeout, self.chain_client.submit(call)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "Chain call {} timed out after {:?}",
                method,
                timeout
            )),
        }
    }
}
