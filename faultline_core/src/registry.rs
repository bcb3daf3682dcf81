//! Route → anomaly registry.
//!
//! Buckets are keyed by the exact (case-sensitive) route string. The
//! wildcard bucket `*` is an ordinary bucket on write and fans in on read:
//! every route lookup returns the wildcard anomalies first, then the
//! route-specific ones, each in registration order.

use crate::anomaly::Anomaly;
use faultline_env::{is_wildcard, ALL_ROUTES_KEYWORD};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

type Buckets = BTreeMap<String, Vec<Arc<Anomaly>>>;

/// In-memory store mapping routes to their registered anomalies.
///
/// Safe to share across request handlers. Every read clones the `Arc`s out
/// under the read lock, so a lookup never observes a half-applied mutation.
#[derive(Debug, Default)]
pub struct AnomalyRegistry {
    buckets: RwLock<Buckets>,
}

impl AnomalyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped registry for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> RwLockReadGuard<'_, Buckets> {
        // A panicking writer cannot leave a bucket half-appended
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Buckets> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `anomaly` to its route's bucket, creating the bucket if absent.
    ///
    /// No de-duplication: registering the same shape twice compounds it.
    pub fn register_anomaly(&self, anomaly: Anomaly) -> Arc<Anomaly> {
        let anomaly = Arc::new(anomaly);
        let mut buckets = self.write();
        let bucket = buckets.entry(anomaly.route().to_string()).or_default();
        bucket.push(Arc::clone(&anomaly));

        info!(
            route = anomaly.route(),
            kind = anomaly.kind_name(),
            id = %anomaly.id(),
            bucket_len = bucket.len(),
            "Registered anomaly"
        );

        anomaly
    }

    /// Every registered anomaly, bucket by bucket, each in insertion order.
    ///
    /// Buckets are visited in key order, so `*` comes before any `/` route.
    pub fn all_anomalies(&self) -> Vec<Arc<Anomaly>> {
        self.read().values().flatten().cloned().collect()
    }

    /// Anomalies that apply to `route`: the wildcard bucket, then the
    /// route's own bucket. Empty if neither exists.
    pub fn anomalies_for(&self, route: &str) -> Vec<Arc<Anomaly>> {
        let buckets = self.read();
        let mut applicable: Vec<Arc<Anomaly>> = buckets
            .get(ALL_ROUTES_KEYWORD)
            .map(|bucket| bucket.to_vec())
            .unwrap_or_default();

        if !is_wildcard(route) {
            if let Some(bucket) = buckets.get(route) {
                applicable.extend(bucket.iter().cloned());
            }
        }

        applicable
    }

    /// Empties exactly the named bucket. Unknown routes are a no-op.
    ///
    /// The wildcard bucket is only cleared when `route` is `*` itself.
    /// Returns how many anomalies were removed.
    pub fn clear_anomalies(&self, route: &str) -> usize {
        let removed = self.write().remove(route).map(|bucket| bucket.len()).unwrap_or(0);

        info!(route, removed, "Cleared anomalies");
        removed
    }

    /// Routes that currently hold at least one anomaly.
    pub fn routes(&self) -> Vec<String> {
        self.read()
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(route, _)| route.clone())
            .collect()
    }

    /// Total number of registered anomalies across all routes.
    pub fn len(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
