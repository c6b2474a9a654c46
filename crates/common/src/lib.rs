//! Shared types and configuration for the tumbler workspace.
//!
//! # Invariants
//! - Configuration is immutable once a scene has been built from it.
//! - Every configuration field has a default, so partial files are valid.

pub mod config;
pub mod types;

pub use config::{
    CameraConfig, ConfigError, LightingConfig, RigConfig, SceneConfig, SpotLightConfig,
    SurfaceConfig, WaveAdvance, WaveRanges,
};
pub use types::{Transform, rgb_hex};
