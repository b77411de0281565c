pub mod chain_client;
pub mod chain_receipt;
pub mod db;
pub mod entities;
