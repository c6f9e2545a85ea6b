//! Store capability negotiation.
//!
//! Backends differ in what they can guarantee: the Postgres backend has
//! native `ON CONFLICT` upserts and multi-statement transactions, while a
//! constrained store may have neither. Each backend determines its
//! capabilities once, at construction or connection time, and reports the
//! cached result here. Callers branch on the struct instead of probing the
//! store per call and catching errors.

use serde::{Deserialize, Serialize};

/// What the backing store can guarantee, fixed at connection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCapabilities {
    /// The store can replace an occupied cell atomically, keyed on
    /// `(version, day, period)`. Without it, placement falls back to
    /// delete-then-insert, which can race under concurrent writers.
    pub atomic_upsert: bool,
    /// The store can run the three publish steps as one transaction.
    /// Without it, publish is serialized step by step and a partial failure
    /// is reported distinctly.
    pub transactional_publish: bool,
}

impl StoreCapabilities {
    /// Everything guaranteed; the normal case for both bundled backends.
    pub fn full() -> Self {
        StoreCapabilities {
            atomic_upsert: true,
            transactional_publish: true,
        }
    }

    /// Nothing beyond plain reads and writes guaranteed.
    pub fn minimal() -> Self {
        StoreCapabilities {
            atomic_upsert: false,
            transactional_publish: false,
        }
    }
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        StoreCapabilities::full()
    }
}

/// Reports the capabilities a backend negotiated at construction time.
pub trait CapabilityReport {
    /// The cached capability set. Cheap; never re-probes the store.
    fn capabilities(&self) -> StoreCapabilities;
}
