// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Editor configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a valid
//! configuration. The choice cap is not configurable.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    /// Prefix for client-side ids handed out before the store assigns a permanent one.
    pub temp_id_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            temp_id_prefix: "temp-".to_owned(),
        }
    }
}

/// Canvas placement rules for chapters nobody has arranged yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub fallback_x: f64,
    pub fallback_origin_y: f64,
    pub row_spacing: f64,
    /// Vertical distance between a chapter and a linked chapter created from it.
    pub linked_offset_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            fallback_x: 100.0,
            fallback_origin_y: 100.0,
            row_spacing: 200.0,
            linked_offset_y: 200.0,
        }
    }
}

impl LayoutConfig {
    /// Vertical stack at a fixed x; row `index` sits `index * row_spacing` below the origin.
    pub fn fallback_position(&self, index: usize) -> Position {
        Position::new(
            self.fallback_x,
            self.fallback_origin_y + index as f64 * self.row_spacing,
        )
    }

    pub fn linked_position(&self, origin: Position) -> Position {
        origin.offset(0.0, self.linked_offset_y)
    }
}

impl EditorConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::Json { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: Some(path.to_path_buf()),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temp_id_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                field: "temp_id_prefix",
                reason: "must not be empty",
            });
        }
        if self.temp_id_prefix.contains('/') {
            return Err(ConfigError::Invalid {
                field: "temp_id_prefix",
                reason: "must not contain '/'",
            });
        }

        let layout = &self.layout;
        for (field, value) in [
            ("layout.fallback_x", layout.fallback_x),
            ("layout.fallback_origin_y", layout.fallback_origin_y),
            ("layout.row_spacing", layout.row_spacing),
            ("layout.linked_offset_y", layout.linked_offset_y),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a finite number",
                });
            }
        }
        if layout.row_spacing <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "layout.row_spacing",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read config {path:?}: {source}"),
            Self::Json {
                path: Some(path),
                source,
            } => write!(f, "invalid config json in {path:?}: {source}"),
            Self::Json { path: None, source } => write!(f, "invalid config json: {source}"),
            Self::Invalid { field, reason } => write!(f, "invalid config: {field} {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Invalid { .. } => None,
        }
    }
}
