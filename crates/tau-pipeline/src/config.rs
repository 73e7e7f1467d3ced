//! Pipeline configuration.
//!
//! Every key is optional. Sources are layered: a file (any format the
//! `config` crate recognises by extension) and then `TAU_`-prefixed
//! environment variables, with `__` separating nested keys:
//!
//! ```text
//! TAU_TAU__SMOOTHING_WINDOW=5
//! TAU_DEBUG_TRIANGLES__MIN=0
//! TAU_DEBUG_TRIANGLES__MAX=4
//! ```

use serde::{Deserialize, Serialize};
use tau_core::{Error, Result};
use tau_tracking::TauConfig;

pub const ENV_PREFIX: &str = "TAU";

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-triangle tracker tuning
    pub tau: TauConfig,

    /// Triangles that get construction lines in the frame bundle
    pub debug_triangles: DebugTriangles,
}

/// Inclusive triangle-index range for construction lines.
///
/// Disabled while both bounds are unset; a single unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugTriangles {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl DebugTriangles {
    pub fn range(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.is_enabled()
            && self.min.map_or(true, |min| index >= min)
            && self.max.map_or(true, |max| index <= max)
    }
}

impl PipelineConfig {
    /// Load configuration from file, then environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        Self::load(
            config::Config::builder()
                .add_source(config::File::with_name(path))
                .add_source(environment()),
        )
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(config::Config::builder().add_source(environment()))
    }

    fn load(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: Self = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tau.validate()?;

        if let (Some(min), Some(max)) = (self.debug_triangles.min, self.debug_triangles.max) {
            if min > max {
                return Err(Error::Config(format!(
                    "debug_triangles.min ({min}) is greater than debug_triangles.max ({max})"
                )));
            }
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
