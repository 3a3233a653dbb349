//! Configuration types for building interaction graphs.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources such as the CLI's TOML configuration file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`GraphConfig`] - Discretization tolerances used when positions are
//!   bucketed into rows and columns.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.graph().row_tolerance(), 3.0);
//! ```

use serde::Deserialize;

/// Positions closer than this many pixels share a row or column.
const DEFAULT_TOLERANCE: f32 = 3.0;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Graph construction section.
    #[serde(default)]
    graph: GraphConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified graph configuration.
    pub fn new(graph: GraphConfig) -> Self {
        Self { graph }
    }

    /// Returns the graph configuration.
    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }
}

/// Discretization settings for the row and column index.
///
/// Two vertical positions whose distance to the first position of a row is
/// within `row_tolerance` pixels collapse into that row. Columns behave the
/// same horizontally with `column_tolerance`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_tolerance")]
    row_tolerance: f32,

    #[serde(default = "default_tolerance")]
    column_tolerance: f32,
}

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_TOLERANCE,
            column_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl GraphConfig {
    /// Creates a new [`GraphConfig`].
    ///
    /// Negative tolerances are clamped to zero.
    pub fn new(row_tolerance: f32, column_tolerance: f32) -> Self {
        Self {
            row_tolerance: row_tolerance.max(0.0),
            column_tolerance: column_tolerance.max(0.0),
        }
    }

    /// Returns the vertical bucketing tolerance in pixels.
    pub fn row_tolerance(&self) -> f32 {
        self.row_tolerance.max(0.0)
    }

    /// Returns the horizontal bucketing tolerance in pixels.
    pub fn column_tolerance(&self) -> f32 {
        self.column_tolerance.max(0.0)
    }
}
