//! Loading and saving the user-facing part of [`EngineConfig`] through a
//! host-supplied key-value store.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};

use tracing::warn;

use crate::color::Color;
use crate::engine::EngineConfig;
use crate::error::BuildError;
use crate::float::Float;

pub const LOOP_COUNT: &str = "rosary.loop_count";
pub const TAIL_COUNT: &str = "rosary.tail_count";
pub const SEGMENT_LENGTH: &str = "rosary.segment_length";
pub const ITERATIONS: &str = "rosary.iterations";
pub const COLOR_LOOP_START: &str = "rosary.color.loop_start";
pub const COLOR_LOOP_END: &str = "rosary.color.loop_end";
pub const COLOR_TAIL: &str = "rosary.color.tail";
pub const COLOR_TERMINAL: &str = "rosary.color.terminal";
pub const COLOR_ANCHOR: &str = "rosary.color.anchor";

/// String get/set storage owned by the host (local storage, a settings file).
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

impl<F: Float> EngineConfig<F> {
    /// Overlay stored preferences on `defaults`. Missing keys keep the
    /// default; present but unusable values are errors.
    pub fn load_from<S: PreferenceStore + ?Sized>(store: &S, defaults: EngineConfig<F>) -> Result<Self, BuildError> {
        let mut config = defaults;

        if let Some(n) = read_count(store, LOOP_COUNT)? {
            config.chain.loop_count = n;
        }
        if let Some(n) = read_count(store, TAIL_COUNT)? {
            config.chain.tail_count = n;
        }
        if let Some(raw) = store.get(SEGMENT_LENGTH) {
            let value: f64 = raw.trim().parse().map_err(|_| malformed(SEGMENT_LENGTH, raw.clone()))?;
            if !(value.is_finite() && value > 0.0) {
                return Err(BuildError::InvalidParameter { name: "base_segment_length", value });
            }
            config.chain.base_segment_length = F::from_f64(value);
        }
        if let Some(n) = read_count(store, ITERATIONS)? {
            if n == 0 {
                warn!(key = ITERATIONS, "zero iterations requested, using 1");
            }
            config.solver = config.solver.with_iterations(n);
        }

        let colors = &mut config.colors;
        for (key, slot) in [
            (COLOR_LOOP_START, &mut colors.loop_start),
            (COLOR_LOOP_END, &mut colors.loop_end),
            (COLOR_TAIL, &mut colors.tail),
            (COLOR_TERMINAL, &mut colors.terminal),
            (COLOR_ANCHOR, &mut colors.anchor),
        ] {
            if let Some(raw) = store.get(key) {
                *slot = Color::from_hex(&raw).ok_or_else(|| malformed(key, raw.clone()))?;
            }
        }

        Ok(config)
    }

    /// Write every key [`load_from`](Self::load_from) reads.
    pub fn save_to<S: PreferenceStore + ?Sized>(&self, store: &mut S) {
        store.set(LOOP_COUNT, self.chain.loop_count.to_string());
        store.set(TAIL_COUNT, self.chain.tail_count.to_string());
        store.set(SEGMENT_LENGTH, format!("{}", self.chain.base_segment_length.to_f64()));
        store.set(ITERATIONS, self.solver.iterations.to_string());
        store.set(COLOR_LOOP_START, self.colors.loop_start.to_hex());
        store.set(COLOR_LOOP_END, self.colors.loop_end.to_hex());
        store.set(COLOR_TAIL, self.colors.tail.to_hex());
        store.set(COLOR_TERMINAL, self.colors.terminal.to_hex());
        store.set(COLOR_ANCHOR, self.colors.anchor.to_hex());
    }
}

fn read_count<S: PreferenceStore + ?Sized>(store: &S, key: &'static str) -> Result<Option<usize>, BuildError> {
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };
    let value: i64 = raw.trim().parse().map_err(|_| malformed(key, raw.clone()))?;
    if value < 0 {
        return Err(BuildError::NegativeCount { name: key, value });
    }
    usize::try_from(value)
        .map(Some)
        .map_err(|_| malformed(key, raw))
}

fn malformed(key: &'static str, value: String) -> BuildError {
    BuildError::MalformedPreference { key, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let store = MemoryStore::new();
        let config = EngineConfig::<f64>::load_from(&store, EngineConfig::default()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn save_then_load_restores_user_settings() {
        let mut original = EngineConfig::<f64>::default();
        original.chain.loop_count = 10;
        original.chain.tail_count = 3;
        original.chain.base_segment_length = 12.5;
        original.solver.iterations = 4;
        original.colors.tail = Color::rgb(1, 2, 3);

        let mut store = MemoryStore::new();
        original.save_to(&mut store);
        assert_eq!(store.len(), 9);
        assert_eq!(store.get(SEGMENT_LENGTH).as_deref(), Some("12.5"));

        let loaded = EngineConfig::load_from(&store, EngineConfig::default()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut store = MemoryStore::new();
        store.set(TAIL_COUNT, "-2".into());
        let err = EngineConfig::<f64>::load_from(&store, EngineConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::NegativeCount { name: TAIL_COUNT, value: -2 });
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut store = MemoryStore::new();
        store.set(LOOP_COUNT, "many".into());
        let err = EngineConfig::<f64>::load_from(&store, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BuildError::MalformedPreference { key: LOOP_COUNT, .. }));

        let mut store = MemoryStore::new();
        store.set(COLOR_ANCHOR, "gold".into());
        let err = EngineConfig::<f64>::load_from(&store, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BuildError::MalformedPreference { key: COLOR_ANCHOR, .. }));

        let mut store = MemoryStore::new();
        store.set(SEGMENT_LENGTH, "0".into());
        let err = EngineConfig::<f64>::load_from(&store, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BuildError::InvalidParameter { name: "base_segment_length", .. }));
    }
}
