//! Folds relay calls into the fixed-shape summaries the dashboard renders.
//!
//! Every function here is total: relay failures are logged and replaced by the
//! documented zero values, never returned.

use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Value};
use solana_sdk::clock::DEFAULT_MS_PER_SLOT;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use tracing::{debug, warn};

use crate::models::{
    BlockSummary, ChainSummary, EpochInfo, PerformanceSample, PriceSummary, PrioritizationFee,
    RpcBlock, RpcConfirmedTransaction, RpcContextValue, RpcTransactionWithMeta, Supply,
    TransactionSummary, UptimePoint, ValidatorSummary, VoteAccounts, SLO_TARGET,
};
use crate::rpc::RpcRelay;

/// Upper bound on blocks fetched per recent-activity walk.
pub const MAX_RECENT_BLOCKS: usize = 10;
pub const PERFORMANCE_SAMPLE_LIMIT: usize = 60;
pub const BASE_SIGNATURE_FEE_LAMPORTS: u64 = 5_000;
pub const DEFAULT_COMPUTE_UNITS: u64 = 200_000;

const UPTIME_FLOOR: f64 = 95.0;
const UPTIME_CEIL: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
pub enum TransactionDetails {
    Full,
    Signatures,
}

impl TransactionDetails {
    fn as_str(&self) -> &'static str {
        match self {
            TransactionDetails::Full => "full",
            TransactionDetails::Signatures => "signatures",
        }
    }
}

pub(crate) fn block_params(slot: u64, details: TransactionDetails) -> Vec<Value> {
    vec![
        json!(slot),
        json!({
            "encoding": "json",
            "transactionDetails": details.as_str(),
            "rewards": false,
            "maxSupportedTransactionVersion": 0,
        }),
    ]
}

pub(crate) async fn fetch_block(relay: &RpcRelay, slot: u64, details: TransactionDetails) -> Option<RpcBlock> {
    match relay
        .fetch::<Option<RpcBlock>>("getBlock", block_params(slot, details))
        .await
    {
        Ok(block) => block,
        Err(e) => {
            debug!(slot, "Block fetch failed: {}", e);
            None
        }
    }
}

pub fn lamports_to_display(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Formats a lamport amount as display-unit billions, e.g. `"21.00B"`.
pub fn format_supply(lamports: u64) -> String {
    format!("{:.2}B", lamports_to_display(lamports) / 1_000_000_000.0)
}

pub async fn get_chain_summary(relay: &RpcRelay) -> ChainSummary {
    let (health, height, epoch, supply) = tokio::join!(
        relay.fetch::<String>("getHealth", vec![]),
        relay.fetch::<u64>("getBlockHeight", vec![]),
        relay.fetch::<EpochInfo>("getEpochInfo", vec![]),
        relay.fetch::<RpcContextValue<Supply>>(
            "getSupply",
            vec![json!({"excludeNonCirculatingAccountsList": true})]
        ),
    );

    let block_height = match height {
        Ok(height) => height,
        Err(e) => {
            warn!("Chain height unavailable: {}", e);
            return ChainSummary::default();
        }
    };

    let is_healthy = matches!(health.as_deref(), Ok("ok"));
    let (current_epoch, current_slot) = epoch
        .map(|info| (info.epoch, info.absolute_slot))
        .unwrap_or_default();
    let (total_supply, circulating_supply) = match supply {
        Ok(supply) => (
            format_supply(supply.value.total),
            format_supply(supply.value.circulating),
        ),
        Err(_) => (format_supply(0), format_supply(0)),
    };

    ChainSummary {
        total_supply,
        circulating_supply,
        current_epoch,
        current_slot,
        block_height,
        is_healthy,
    }
}

/// Slots walked back from `current`, newest first.
pub fn recent_slots(current: u64, limit: usize) -> Vec<u64> {
    (0..limit.min(MAX_RECENT_BLOCKS) as u64)
        .map_while(|offset| current.checked_sub(offset))
        .collect()
}

async fn current_slot(relay: &RpcRelay) -> Option<u64> {
    match relay.fetch::<u64>("getSlot", vec![]).await {
        Ok(slot) => Some(slot),
        Err(e) => {
            warn!("Current slot unavailable: {}", e);
            None
        }
    }
}

pub fn summarize_block_transaction(
    slot: u64,
    block_time: Option<i64>,
    tx: &RpcTransactionWithMeta,
) -> Option<TransactionSummary> {
    let signature = tx.transaction.signatures.first()?.clone();
    Some(TransactionSummary {
        signature,
        slot,
        timestamp: block_time.unwrap_or(0),
        success: tx.meta.as_ref().map_or(true, |meta| meta.err.is_none()),
        fee: tx.meta.as_ref().map_or(0, |meta| meta.fee),
        instruction_count: tx.transaction.message.instructions.len(),
    })
}

pub fn summarize_transaction(tx: &RpcConfirmedTransaction) -> Option<TransactionSummary> {
    let signature = tx.transaction.signatures.first()?.clone();
    Some(TransactionSummary {
        signature,
        slot: tx.slot,
        timestamp: tx.block_time.unwrap_or(0),
        success: tx.meta.as_ref().map_or(true, |meta| meta.err.is_none()),
        fee: tx.meta.as_ref().map_or(0, |meta| meta.fee),
        instruction_count: tx.transaction.message.instructions.len(),
    })
}

pub fn summarize_block(slot: u64, block: &RpcBlock) -> BlockSummary {
    BlockSummary {
        slot,
        hash: block.blockhash.clone(),
        timestamp: block.block_time.unwrap_or(0),
        transaction_count: block.transaction_count(),
        parent_slot: block.parent_slot,
    }
}

pub async fn get_recent_transactions(relay: &RpcRelay, limit: usize) -> Vec<TransactionSummary> {
    if limit == 0 {
        return Vec::new();
    }
    let Some(current) = current_slot(relay).await else {
        return Vec::new();
    };

    let slots = recent_slots(current, limit);
    let blocks = join_all(
        slots
            .iter()
            .map(|&slot| fetch_block(relay, slot, TransactionDetails::Full)),
    )
    .await;

    let mut transactions: Vec<TransactionSummary> = slots
        .iter()
        .zip(blocks)
        .filter_map(|(&slot, block)| block.map(|block| (slot, block)))
        .flat_map(|(slot, block)| {
            let block_time = block.block_time;
            block
                .transactions
                .unwrap_or_default()
                .into_iter()
                .filter_map(move |tx| summarize_block_transaction(slot, block_time, &tx))
        })
        .collect();
    transactions.truncate(limit);
    transactions
}

pub async fn get_recent_blocks(relay: &RpcRelay, limit: usize) -> Vec<BlockSummary> {
    if limit == 0 {
        return Vec::new();
    }
    let Some(current) = current_slot(relay).await else {
        return Vec::new();
    };

    let slots = recent_slots(current, limit);
    let blocks = join_all(
        slots
            .iter()
            .map(|&slot| fetch_block(relay, slot, TransactionDetails::Signatures)),
    )
    .await;

    let mut summaries: Vec<BlockSummary> = slots
        .iter()
        .zip(blocks)
        .filter_map(|(&slot, block)| block.map(|block| summarize_block(slot, &block)))
        .collect();
    summaries.truncate(limit);
    summaries
}

/// Uptime of one performance sample: produced slots over the slots expected in
/// its period. Returns `None` for a zero-length period.
pub fn sample_uptime(sample: &PerformanceSample) -> Option<f64> {
    let expected = sample.sample_period_secs.saturating_mul(1000) / DEFAULT_MS_PER_SLOT;
    if expected == 0 {
        return None;
    }
    Some(sample.num_slots as f64 / expected as f64 * 100.0)
}

/// Builds the oldest-first uptime series from newest-first samples, counting
/// timestamps back from `now`. Also returns the number of samples whose raw
/// uptime missed the SLO.
pub fn uptime_history(samples: &[PerformanceSample], now: i64) -> (Vec<UptimePoint>, usize) {
    let mut points = Vec::with_capacity(samples.len());
    let mut incidents = 0;
    let mut time = now;

    for sample in samples {
        if let Some(raw) = sample_uptime(sample) {
            if raw < SLO_TARGET {
                incidents += 1;
            }
            points.push(UptimePoint {
                time,
                uptime: raw.clamp(UPTIME_FLOOR, UPTIME_CEIL),
            });
        }
        time = time.saturating_sub(i64::try_from(sample.sample_period_secs).unwrap_or(i64::MAX));
    }

    points.reverse();
    (points, incidents)
}

pub fn current_uptime(total_validators: usize, history: &[UptimePoint]) -> f64 {
    if total_validators == 0 {
        return 0.0;
    }
    if history.is_empty() {
        return 100.0;
    }
    history.iter().map(|point| point.uptime).sum::<f64>() / history.len() as f64
}

pub async fn get_validator_summary(relay: &RpcRelay) -> ValidatorSummary {
    let (votes, samples, epoch, supply) = tokio::join!(
        relay.fetch_timed::<VoteAccounts>("getVoteAccounts", vec![]),
        relay.fetch_timed::<Vec<PerformanceSample>>(
            "getRecentPerformanceSamples",
            vec![json!(PERFORMANCE_SAMPLE_LIMIT)]
        ),
        relay.fetch_timed::<EpochInfo>("getEpochInfo", vec![]),
        relay.fetch_timed::<RpcContextValue<Supply>>(
            "getSupply",
            vec![json!({"excludeNonCirculatingAccountsList": true})]
        ),
    );

    let latencies: Vec<u128> = [
        votes.as_ref().ok().map(|(_, ms)| *ms),
        samples.as_ref().ok().map(|(_, ms)| *ms),
        epoch.as_ref().ok().map(|(_, ms)| *ms),
        supply.as_ref().ok().map(|(_, ms)| *ms),
    ]
    .into_iter()
    .flatten()
    .collect();

    let (votes, _) = match votes {
        Ok(votes) => votes,
        Err(e) => {
            warn!("Vote accounts unavailable: {}", e);
            return ValidatorSummary::default();
        }
    };

    let active_validators = votes.current.len();
    let delinquent_validators = votes.delinquent.len();
    let total_validators = active_validators + delinquent_validators;
    let staked_lamports: u128 = votes
        .current
        .iter()
        .chain(votes.delinquent.iter())
        .map(|account| account.activated_stake as u128)
        .sum();

    let percent_of_supply = match &supply {
        Ok((supply, _)) if supply.value.total > 0 => {
            (staked_lamports as f64 / supply.value.total as f64 * 100.0).min(100.0)
        }
        _ => 0.0,
    };

    let samples = samples.map(|(samples, _)| samples).unwrap_or_default();
    let (uptime_history, incident_count) = uptime_history(&samples, Utc::now().timestamp());
    let current_uptime = current_uptime(total_validators, &uptime_history);

    if let Ok((info, _)) = &epoch {
        debug!(epoch = info.epoch, slot_index = info.slot_index, "Validator summary epoch");
    }

    let avg_response_ms = mean_latency_ms(&latencies);

    ValidatorSummary {
        total_validators,
        active_validators,
        delinquent_validators,
        all_active_healthy: total_validators > 0 && delinquent_validators == 0,
        total_staked: staked_lamports as f64 / LAMPORTS_PER_SOL as f64,
        percent_of_supply,
        current_uptime,
        slo_met: current_uptime >= SLO_TARGET,
        incident_count,
        avg_response_ms,
        uptime_history,
        ..ValidatorSummary::default()
    }
}

/// Mean of the measured round-trips, 0 when no call succeeded.
pub fn mean_latency_ms(latencies: &[u128]) -> u64 {
    if latencies.is_empty() {
        return 0;
    }
    let mean = latencies.iter().fold(0u128, |acc, ms| acc.saturating_add(*ms)) / latencies.len() as u128;
    u64::try_from(mean).unwrap_or(u64::MAX)
}

/// Estimated lamports for a default-sized transaction at the recent priority fee level.
pub fn estimate_fee_lamports(fees: &[PrioritizationFee]) -> u64 {
    if fees.is_empty() {
        return BASE_SIGNATURE_FEE_LAMPORTS;
    }
    let total: u128 = fees.iter().map(|fee| fee.prioritization_fee as u128).sum();
    let mean_micro_lamports = u64::try_from(total / fees.len() as u128).unwrap_or(u64::MAX);
    BASE_SIGNATURE_FEE_LAMPORTS
        .saturating_add(mean_micro_lamports.saturating_mul(DEFAULT_COMPUTE_UNITS) / 1_000_000)
}

pub fn transactions_per_second(samples: &[PerformanceSample]) -> f64 {
    let period: u128 = samples.iter().map(|s| s.sample_period_secs as u128).sum();
    if period == 0 {
        return 0.0;
    }
    let transactions: u128 = samples.iter().map(|s| s.num_transactions as u128).sum();
    transactions as f64 / period as f64
}

pub async fn get_price_summary(relay: &RpcRelay) -> PriceSummary {
    let (fees, samples) = tokio::join!(
        relay.fetch::<Vec<PrioritizationFee>>("getRecentPrioritizationFees", vec![]),
        relay.fetch::<Vec<PerformanceSample>>(
            "getRecentPerformanceSamples",
            vec![json!(PERFORMANCE_SAMPLE_LIMIT)]
        ),
    );

    let avg_fee = match fees {
        Ok(fees) => lamports_to_display(estimate_fee_lamports(&fees)),
        Err(e) => {
            debug!("Fee estimate unavailable: {}", e);
            0.0
        }
    };
    let transactions_per_second = samples
        .map(|samples| transactions_per_second(&samples))
        .unwrap_or(0.0);

    // No price oracle is wired in.
    PriceSummary {
        price: 0.0,
        price_change: 0.0,
        avg_fee,
        transactions_per_second,
    }
}
