//! Feature Vector Assembly

use crate::error::{FeatureError, Result};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;
use waveform::Waveform;

/// Channel-qualified feature name, e.g. `rms_ch2`
pub fn channel_key(feature: &str, channel: usize) -> String {
    format!("{feature}_ch{channel}")
}

/// Named scalar features in insertion order.
///
/// Names are unique; inserting an existing name fails. Serializes as a
/// map from name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    features: IndexMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            features: IndexMap::with_capacity(capacity),
        }
    }

    /// Add a feature, rejecting a name already present
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Result<()> {
        match self.features.entry(name.into()) {
            Entry::Occupied(entry) => Err(FeatureError::DuplicateFeatureKey {
                key: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Append every feature of `other`. Nothing is added if any name collides.
    pub fn merge(&mut self, other: FeatureVector) -> Result<()> {
        if let Some(key) = other.features.keys().find(|k| self.features.contains_key(*k)) {
            return Err(FeatureError::DuplicateFeatureKey { key: key.clone() });
        }
        self.features.extend(other.features);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.features.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// A family of per-channel features computed from a waveform
pub trait FeatureSet: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Number of features produced for one waveform
    fn feature_count(&self) -> usize;

    /// Compute all features, all-or-nothing
    fn extract(&self, waveform: &Waveform) -> Result<FeatureVector>;
}

/// Runs several feature sets and merges their output
#[derive(Default)]
pub struct FeatureAssembler {
    sets: Vec<Box<dyn FeatureSet>>,
}

impl FeatureAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature set; sets run in registration order
    pub fn with<F: FeatureSet + 'static>(mut self, set: F) -> Self {
        self.push(Box::new(set));
        self
    }

    pub fn push(&mut self, set: Box<dyn FeatureSet>) {
        self.sets.push(set);
    }

    /// Total features across all registered sets
    pub fn feature_count(&self) -> usize {
        self.sets.iter().map(|s| s.feature_count()).sum()
    }

    /// Extract and merge every set, failing on the first error or name collision
    pub fn assemble(&self, waveform: &Waveform) -> Result<FeatureVector> {
        let mut features = FeatureVector::with_capacity(self.feature_count());
        for set in &self.sets {
            let extracted = set.extract(waveform)?;
            debug!("Feature set '{}' produced {} features", set.name(), extracted.len());
            features.merge(extracted)?;
        }
        Ok(features)
    }
}
