use serde::{Deserialize, Serialize};
use serde_json::Value;

// Summaries handed to the dashboard. Every field has a zero default so a failed
// poll still renders a complete shape.

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub total_supply: String,
    pub circulating_supply: String,
    pub current_epoch: u64,
    pub current_slot: u64,
    pub block_height: u64,
    pub is_healthy: bool,
}

impl Default for ChainSummary {
    fn default() -> Self {
        Self {
            total_supply: "0.00B".to_string(),
            circulating_supply: "0.00B".to_string(),
            current_epoch: 0,
            current_slot: 0,
            block_height: 0,
            is_healthy: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub signature: String,
    pub slot: u64,
    pub timestamp: i64,
    pub success: bool,
    pub fee: u64,
    pub instruction_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub slot: u64,
    pub hash: String,
    pub timestamp: i64,
    pub transaction_count: usize,
    pub parent_slot: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummary {
    pub address: String,
    pub lamports: u64,
    pub balance: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UptimePoint {
    pub time: i64,
    pub uptime: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSummary {
    pub total_validators: usize,
    pub active_validators: usize,
    pub delinquent_validators: usize,
    pub all_active_healthy: bool,
    pub total_staked: f64,
    pub percent_of_supply: f64,
    pub current_uptime: f64,
    pub slo_met: bool,
    pub slo_target: f64,
    pub incident_count: usize,
    pub avg_response_ms: u64,
    pub uptime_history: Vec<UptimePoint>,
}

pub const SLO_TARGET: f64 = 99.9;

impl Default for ValidatorSummary {
    fn default() -> Self {
        Self {
            total_validators: 0,
            active_validators: 0,
            delinquent_validators: 0,
            all_active_healthy: false,
            total_staked: 0.0,
            percent_of_supply: 0.0,
            current_uptime: 0.0,
            slo_met: false,
            slo_target: SLO_TARGET,
            incident_count: 0,
            avg_response_ms: 0,
            uptime_history: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub price: f64,
    pub price_change: f64,
    pub avg_fee: f64,
    pub transactions_per_second: f64,
}

/// Outcome of a search query, tagged by which probe matched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum SearchResult {
    Transaction(TransactionSummary),
    Block(BlockSummary),
    Address(AddressSummary),
}

// Upstream result shapes. Only the fields the adapter reads are declared.

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
    pub slot_index: u64,
    pub slots_in_epoch: u64,
    pub absolute_slot: u64,
    #[serde(default)]
    pub block_height: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcContextValue<T> {
    pub value: T,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Supply {
    pub total: u64,
    pub circulating: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub blockhash: String,
    pub parent_slot: u64,
    pub block_time: Option<i64>,
    #[serde(default)]
    pub transactions: Option<Vec<RpcTransactionWithMeta>>,
    #[serde(default)]
    pub signatures: Option<Vec<String>>,
}

impl RpcBlock {
    pub fn transaction_count(&self) -> usize {
        match (&self.signatures, &self.transactions) {
            (Some(signatures), _) => signatures.len(),
            (None, Some(transactions)) => transactions.len(),
            (None, None) => 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcTransactionWithMeta {
    pub transaction: RpcTransaction,
    pub meta: Option<RpcTransactionMeta>,
}

/// Result of `getTransaction`: the block context is flattened next to the body.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RpcConfirmedTransaction {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub transaction: RpcTransaction,
    pub meta: Option<RpcTransactionMeta>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcTransaction {
    pub signatures: Vec<String>,
    pub message: RpcMessage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcMessage {
    #[serde(default)]
    pub instructions: Vec<Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcTransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VoteAccounts {
    #[serde(default)]
    pub current: Vec<VoteAccount>,
    #[serde(default)]
    pub delinquent: Vec<VoteAccount>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoteAccount {
    pub vote_pubkey: String,
    #[serde(default)]
    pub activated_stake: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub slot: u64,
    pub num_slots: u64,
    pub num_transactions: u64,
    pub sample_period_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationFee {
    pub slot: u64,
    pub prioritization_fee: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_result_is_kind_tagged() {
        let result = SearchResult::Address(AddressSummary {
            address: "addr".to_string(),
            lamports: 1_500_000_000,
            balance: 1.5,
        });
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "kind": "address",
                "payload": {"address": "addr", "lamports": 1_500_000_000u64, "balance": 1.5}
            })
        );
    }

    #[test]
    fn default_chain_summary_shape() {
        assert_eq!(
            serde_json::to_value(ChainSummary::default()).unwrap(),
            json!({
                "totalSupply": "0.00B",
                "circulatingSupply": "0.00B",
                "currentEpoch": 0,
                "currentSlot": 0,
                "blockHeight": 0,
                "isHealthy": false
            })
        );
    }

    #[test]
    fn block_counts_prefer_signature_list() {
        let block: RpcBlock = serde_json::from_value(json!({
            "blockhash": "hash",
            "parentSlot": 9,
            "blockTime": null,
            "signatures": ["a", "b", "c"]
        }))
        .unwrap();
        assert_eq!(block.transaction_count(), 3);
        assert_eq!(block.block_time, None);
    }
}
