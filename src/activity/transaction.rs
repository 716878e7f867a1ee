use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Default)]
pub enum TransactionStatus {
    #[default]
    Unapproved,
    Approved,
    Rejected,
    Submitted,
    Confirmed,
    Error,
    Dropped,
    Signed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct TransactionInfo {
    pub id: String,
    pub from_address: String,
    pub tx_hash: String,
    pub status: TransactionStatus,
    pub created_time: DateTime<Utc>,
}

/// A precomputed, display-ready row of the activity list.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct TransactionSummary {
    pub tx_info: TransactionInfo,
    pub title: String,
    pub from_address: String,
    pub to_address: String,
    pub network_symbol: String,
    pub date_created: DateTime<Utc>,
}

impl TransactionSummary {
    pub fn id(&self) -> &str {
        &self.tx_info.id
    }
}
