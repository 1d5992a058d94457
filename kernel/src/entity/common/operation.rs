use serde::{Deserialize, Serialize};
use vodca::AsRefln;

const DEFAULT_LIMIT: i64 = 30;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefln, Serialize, Deserialize)]
#[serde(from = "i64")]
pub struct SelectLimit(i64);

impl SelectLimit {
    /// Clamped into `1..=100`.
    pub fn new(value: impl Into<i64>) -> Self {
        SelectLimit(value.into().clamp(1, MAX_LIMIT))
    }
}

impl Default for SelectLimit {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl From<i64> for SelectLimit {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, AsRefln, Serialize, Deserialize)]
#[serde(from = "i64")]
pub struct SelectOffset(i64);

impl SelectOffset {
    pub fn new(value: impl Into<i64>) -> Self {
        SelectOffset(value.into().max(0))
    }
}

impl From<i64> for SelectOffset {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}
