use {
    super::Service,
    crate::{
        api::RestError,
        kernel::entities::Address,
        transaction::entities,
    },
    time::OffsetDateTime,
    uuid::Uuid,
};

pub struct RecordTransactionInput {
    pub transaction_type: entities::TransactionType,
    /// Identifier of the record the chain call belongs to.
    pub reference:        String,
    pub from:             Address,
    pub to:               Address,
    pub amount:           u64,
    pub price:            u64,
    pub receipt_id:       Option<String>,
}

impl Service {
    /// Appends a completed entry to the ledger.
    ///
    /// Chains that report no receipt id get a hash synthesized from the reference, so the
    /// hash stays unique.
    #[tracing::instrument(skip_all, fields(reference = %input.reference))]
    pub async fn record_transaction(
        &self,
        input: RecordTransactionInput,
    ) -> Result<entities::Transaction, RestError> {
        let transaction_hash = input
            .receipt_id
            .unwrap_or_else(|| format!("{}-{}", input.reference, Uuid::new_v4()));
        let transaction = entities::Transaction {
            id: Uuid::new_v4(),
            transaction_type: input.transaction_type,
            from: input.from,
            to: input.to,
            amount: input.amount,
            price: input.price,
            transaction_hash,
            status: entities::TransactionStatus::Completed,
            timestamp: OffsetDateTime::now_utc(),
        };
        self.repo.add_transaction(&transaction).await?;
        Ok(transaction)
    }
}
