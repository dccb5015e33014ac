//! Bounded, thread-safe cache of enrichment results keyed by address.
//!
//! Eviction is FIFO by insertion order. Re-inserting an address refreshes its
//! position without changing occupancy. Reads never trigger enrichment.

#![doc(html_root_url = "https://docs.rs/echoip-cache/0.1.0")]

mod cache;
mod stats;

pub use cache::ResultCache;
pub use stats::CacheStats;
