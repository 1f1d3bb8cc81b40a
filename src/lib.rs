//! Explorer backend for a Solana-style chain: a JSON-RPC relay, the chain data
//! adapters behind each dashboard card, and the free-text search resolver.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod rpc;
pub mod search;
