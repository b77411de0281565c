#[cfg(test)]
use mockall::automock;
use {
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::Address,
        },
        transaction::entities,
    },
    axum::async_trait,
    sqlx::{
        types::BigDecimal,
        FromRow,
        QueryBuilder,
    },
    std::fmt::Debug,
    time::PrimitiveDateTime,
    tracing::instrument,
    uuid::Uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
pub enum TransactionType {
    Auction,
    Listing,
    EnergyTransfer,
}

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl From<entities::TransactionType> for TransactionType {
    fn from(value: entities::TransactionType) -> Self {
        match value {
            entities::TransactionType::Auction => Self::Auction,
            entities::TransactionType::Listing => Self::Listing,
            entities::TransactionType::EnergyTransfer => Self::EnergyTransfer,
        }
    }
}

impl From<TransactionType> for entities::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Auction => Self::Auction,
            TransactionType::Listing => Self::Listing,
            TransactionType::EnergyTransfer => Self::EnergyTransfer,
        }
    }
}

impl From<entities::TransactionStatus> for TransactionStatus {
    fn from(value: entities::TransactionStatus) -> Self {
        match value {
            entities::TransactionStatus::Pending => Self::Pending,
            entities::TransactionStatus::Completed => Self::Completed,
            entities::TransactionStatus::Failed => Self::Failed,
        }
    }
}

impl From<TransactionStatus> for entities::TransactionStatus {
    fn from(value: TransactionStatus) -> Self {
        match value {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Transaction {
    pub id:               Uuid,
    pub transaction_type: TransactionType,
    pub sender:           String,
    pub receiver:         String,
    pub amount:           BigDecimal,
    pub price:            BigDecimal,
    pub transaction_hash: String,
    pub status:           TransactionStatus,
    pub timestamp:        PrimitiveDateTime,
}

impl TryFrom<Transaction> for entities::Transaction {
    type Error = anyhow::Error;

    fn try_from(transaction: Transaction) -> Result<Self, Self::Error> {
        Ok(Self {
            id:               transaction.id,
            transaction_type: transaction.transaction_type.into(),
            from:             Address::new(&transaction.sender),
            to:               Address::new(&transaction.receiver),
            amount:           transaction.amount.to_string().parse()?,
            price:            transaction.price.to_string().parse()?,
            transaction_hash: transaction.transaction_hash,
            status:           transaction.status.into(),
            timestamp:        transaction.timestamp.assume_utc(),
        })
    }
}

fn into_entities(
    transactions: Vec<Transaction>,
) -> Result<Vec<entities::Transaction>, RestError> {
    transactions
        .into_iter()
        .map(|transaction| {
            let id = transaction.id;
            transaction.try_into().map_err(|e: anyhow::Error| {
                tracing::error!(
                    error = e.to_string(),
                    transaction_id = %id,
                    "Failed to convert database transaction to entity transaction",
                );
                RestError::TemporarilyUnavailable
            })
        })
        .collect()
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_transaction(&self, transaction: &entities::Transaction) -> Result<(), RestError>;
    async fn get_transaction_by_hash(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<entities::Transaction>, RestError>;
    async fn get_transactions(
        &self,
        address: Option<Address>,
    ) -> Result<Vec<entities::Transaction>, RestError>;
}

#[async_trait]
impl Database for DB {
    #[instrument(
        target = "metrics",
        name = "db_add_transaction",
        fields(
            category = "db_queries",
            result = "success",
            name = "add_transaction",
            tracing_enabled
        ),
        skip_all
    )]
    async fn add_transaction(&self, transaction: &entities::Transaction) -> Result<(), RestError> {
        sqlx::query(
            "INSERT INTO transaction (id, transaction_type, sender, receiver, amount, price, transaction_hash, status, timestamp) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(transaction.id)
        .bind(TransactionType::from(transaction.transaction_type))
        .bind(transaction.from.as_str())
        .bind(transaction.to.as_str())
        .bind(BigDecimal::from(transaction.amount))
        .bind(BigDecimal::from(transaction.price))
        .bind(&transaction.transaction_hash)
        .bind(TransactionStatus::from(transaction.status))
        .bind(PrimitiveDateTime::new(
            transaction.timestamp.date(),
            transaction.timestamp.time(),
        ))
        .execute(self)
        .await
        .map_err(|e| {
            tracing::Span::current().record("result", "error");
            tracing::error!(
                error = e.to_string(),
                transaction_hash = transaction.transaction_hash,
                "DB: Failed to insert transaction",
            );
            RestError::TemporarilyUnavailable
        })?;
        Ok(())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_transaction_by_hash",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_transaction_by_hash",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_transaction_by_hash(
        &self,
        transaction_hash: &str,
    ) -> Result<Option<entities::Transaction>, RestError> {
        let transaction: Option<Transaction> =
            sqlx::query_as("SELECT * FROM transaction WHERE transaction_hash = $1")
                .bind(transaction_hash)
                .fetch_optional(self)
                .await
                .map_err(|e| {
                    tracing::Span::current().record("result", "error");
                    tracing::error!(
                        error = e.to_string(),
                        transaction_hash,
                        "DB: Failed to get transaction",
                    );
                    RestError::TemporarilyUnavailable
                })?;
        Ok(into_entities(transaction.into_iter().collect())?.pop())
    }

    #[instrument(
        target = "metrics",
        name = "db_get_transactions",
        fields(
            category = "db_queries",
            result = "success",
            name = "get_transactions",
            tracing_enabled
        ),
        skip_all
    )]
    async fn get_transactions(
        &self,
        address: Option<Address>,
    ) -> Result<Vec<entities::Transaction>, RestError> {
        let mut query = QueryBuilder::new("SELECT * FROM transaction");
        if let Some(address) = &address {
            query.push(" WHERE sender = ");
            query.push_bind(address.to_string());
            query.push(" OR receiver = ");
            query.push_bind(address.to_string());
        }
        query.push(" ORDER BY timestamp DESC LIMIT ");
        query.push_bind(super::TRANSACTION_PAGE_SIZE_CAP);
        let transactions: Vec<Transaction> =
            query.build_query_as().fetch_all(self).await.map_err(|e| {
                tracing::Span::current().record("result", "error");
                tracing::error!(
                    error = e.to_string(),
                    address = ?address,
                    "DB: Failed to fetch transactions",
                );
                RestError::TemporarilyUnavailable
            })?;
        into_entities(transactions)
    }
}
