use serde_json::{json, Value};
use tracing::debug;

use crate::adapter::{
    fetch_block, lamports_to_display, summarize_block, summarize_transaction, TransactionDetails,
};
use crate::models::{AddressSummary, RpcConfirmedTransaction, RpcContextValue, SearchResult};
use crate::rpc::RpcRelay;

const SIGNATURE_MIN_LEN: usize = 80;
const ADDRESS_MIN_LEN: usize = 32;
const ADDRESS_MAX_LEN: usize = 44;

/// A lookup a query is shaped like. Probes are tried in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<'a> {
    Transaction(&'a str),
    Block(u64),
    Address(&'a str),
}

pub fn classify(query: &str) -> Vec<Probe<'_>> {
    let query = query.trim();
    let mut probes = Vec::new();
    if query.is_empty() {
        return probes;
    }

    let len = query.chars().count();
    if len >= SIGNATURE_MIN_LEN {
        probes.push(Probe::Transaction(query));
    }
    if query.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(slot) = query.parse::<u64>() {
            probes.push(Probe::Block(slot));
        }
    }
    if (ADDRESS_MIN_LEN..=ADDRESS_MAX_LEN).contains(&len) {
        probes.push(Probe::Address(query));
    }
    probes
}

/// Resolves a free-text query to the first probe that hits.
pub async fn search(relay: &RpcRelay, query: &str) -> Option<SearchResult> {
    for probe in classify(query) {
        debug!(?probe, "Search probe");
        let hit = match probe {
            Probe::Transaction(signature) => probe_transaction(relay, signature).await,
            Probe::Block(slot) => probe_block(relay, slot).await,
            Probe::Address(address) => probe_address(relay, address).await,
        };
        if hit.is_some() {
            return hit;
        }
    }
    None
}

async fn probe_transaction(relay: &RpcRelay, signature: &str) -> Option<SearchResult> {
    let params = vec![
        json!(signature),
        json!({"encoding": "json", "maxSupportedTransactionVersion": 0}),
    ];
    match relay
        .fetch::<Option<RpcConfirmedTransaction>>("getTransaction", params)
        .await
    {
        Ok(Some(tx)) => summarize_transaction(&tx).map(SearchResult::Transaction),
        Ok(None) => None,
        Err(e) => {
            debug!("Transaction probe failed: {}", e);
            None
        }
    }
}

async fn probe_block(relay: &RpcRelay, slot: u64) -> Option<SearchResult> {
    fetch_block(relay, slot, TransactionDetails::Signatures)
        .await
        .map(|block| SearchResult::Block(summarize_block(slot, &block)))
}

async fn probe_address(relay: &RpcRelay, address: &str) -> Option<SearchResult> {
    match relay
        .fetch::<RpcContextValue<Option<u64>>>("getBalance", vec![Value::from(address)])
        .await
    {
        Ok(RpcContextValue { value: Some(lamports) }) => Some(SearchResult::Address(AddressSummary {
            address: address.to_string(),
            lamports,
            balance: lamports_to_display(lamports),
        })),
        Ok(_) => None,
        Err(e) => {
            debug!("Address probe failed: {}", e);
            None
        }
    }
}
