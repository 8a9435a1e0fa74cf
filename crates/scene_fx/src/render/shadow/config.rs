//! Shadow cascade settings

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Blend between logarithmic and uniform split distances (GPU Gems 3, 10.1.12)
pub const DEFAULT_SPLIT_BLEND: f32 = 0.992;

/// Settings for [`parallel_split_projections`](super::parallel_split_projections)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Number of depth splits (1-4, one atlas quadrant each)
    pub split_count: usize,

    /// 1.0 = fully logarithmic splits, 0.0 = fully uniform
    pub split_blend: f32,

    /// Trim each split's light box to the visible shadow casters
    pub fit_to_casters: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            split_count: super::MAX_CASCADES,
            split_blend: DEFAULT_SPLIT_BLEND,
            fit_to_casters: true,
        }
    }
}

impl Config for ShadowConfig {}
