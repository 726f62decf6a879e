//! Runtime configuration with clamping validation
//!
//! All values are externally supplied (JSON file or code) and clamped into
//! their legal ranges on load. Out-of-range values are never an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::terrain::generator::TerrainParams;

/// Volume window edge bounds (cells per axis)
pub const GRID_SIZE_RANGE: (u32, u32) = (16, 256);
/// Dense traversal step bounds
pub const MAX_STEPS_RANGE: (u32, u32) = (32, 2048);
/// AO hemisphere sample bounds
pub const AO_SAMPLES_RANGE: (u32, u32) = (1, 8);

/// Default render radius in chunks
pub const RENDER_DISTANCE: i32 = 6;

/// Hybrid rendering parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Volume window edge length in cells.
    pub grid_size: u32,
    /// Step bound for dense (volume window) traversal.
    pub max_steps: u32,
    /// Hemisphere rays per pixel for ambient occlusion.
    pub ao_samples: u32,
    /// Blend weight for temporal accumulation. Validated and carried, but
    /// the composite stage does not accumulate across frames.
    pub temporal_blend: f32,
    /// Puddle reflection amount `[0.0, 1.0]`.
    pub rain_intensity: f32,
    /// Whether the composite stage traces reflection rays.
    pub water_reflections: bool,
    /// Start in hybrid mode instead of raster-only.
    pub enabled_on_start: bool,
    /// Viewer displacement (world units) that triggers a volume resample.
    pub rebuild_threshold: f32,
    /// Exponential fog density.
    pub fog_density: f32,
    /// Sky color (linear RGB).
    pub sky_color: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_size: 96,
            max_steps: 128,
            ao_samples: 4,
            temporal_blend: 0.2,
            rain_intensity: 0.5,
            water_reflections: true,
            enabled_on_start: false,
            rebuild_threshold: 8.0,
            fog_density: 0.02,
            // 0x87ceeb
            sky_color: [135.0 / 255.0, 206.0 / 255.0, 235.0 / 255.0],
        }
    }
}

impl RenderConfig {
    /// Return a copy with every field clamped into its legal range
    pub fn validated(&self) -> Self {
        let sky = self.sky_color.map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 });
        Self {
            grid_size: self.grid_size.clamp(GRID_SIZE_RANGE.0, GRID_SIZE_RANGE.1),
            max_steps: self.max_steps.clamp(MAX_STEPS_RANGE.0, MAX_STEPS_RANGE.1),
            ao_samples: self.ao_samples.clamp(AO_SAMPLES_RANGE.0, AO_SAMPLES_RANGE.1),
            temporal_blend: clamp_unit(self.temporal_blend),
            rain_intensity: clamp_unit(self.rain_intensity),
            water_reflections: self.water_reflections,
            enabled_on_start: self.enabled_on_start,
            rebuild_threshold: non_negative(self.rebuild_threshold),
            fog_density: non_negative(self.fog_density),
            sky_color: sky,
        }
    }
}

/// Top-level configuration for a world plus its renderer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World seed for terrain and vegetation
    pub seed: u32,
    /// Chunks generated around the viewer (square radius)
    pub render_distance: i32,
    /// Terrain shaping parameters
    pub terrain: TerrainParams,
    /// Hybrid rendering parameters
    pub render: RenderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            render_distance: RENDER_DISTANCE,
            terrain: TerrainParams::default(),
            render: RenderConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Return a copy with every field clamped into its legal range
    pub fn validated(&self) -> Self {
        Self {
            seed: self.seed,
            render_distance: self.render_distance.clamp(0, 32),
            terrain: self.terrain.validated(),
            render: self.render.validated(),
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&data)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

fn non_negative(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.validated(), cfg);
    }

    #[test]
    fn test_clamping() {
        let cfg = RenderConfig {
            grid_size: 4,
            max_steps: 100_000,
            ao_samples: 0,
            temporal_blend: 3.0,
            rain_intensity: -1.0,
            rebuild_threshold: -5.0,
            ..Default::default()
        }
        .validated();

        assert_eq!(cfg.grid_size, 16);
        assert_eq!(cfg.max_steps, 2048);
        assert_eq!(cfg.ao_samples, 1);
        assert_eq!(cfg.temporal_blend, 1.0);
        assert_eq!(cfg.rain_intensity, 0.0);
        assert_eq!(cfg.rebuild_threshold, 0.0);
    }

    #[test]
    fn test_upper_grid_clamp() {
        let cfg = RenderConfig { grid_size: 1000, ao_samples: 99, ..Default::default() }.validated();
        assert_eq!(cfg.grid_size, 256);
        assert_eq!(cfg.ao_samples, 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{ "seed": 42, "render": { "ao_samples": 12 } }"#).unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.render.ao_samples, 8);
        assert_eq!(cfg.render.grid_size, 96);
        assert_eq!(cfg.render_distance, RENDER_DISTANCE);
    }

    #[test]
    fn test_malformed_json_is_error() {
        let result = EngineConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "render": {{ "enabled_on_start": true, "grid_size": 64 }} }}"#).unwrap();

        let cfg = EngineConfig::load(file.path()).unwrap();
        assert!(cfg.render.enabled_on_start);
        assert_eq!(cfg.render.grid_size, 64);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/voxray.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
