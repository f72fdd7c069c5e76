//! Rendering engine boundary
//!
//! The pipeline only needs three capabilities from the external engine:
//! measure a file's loudness, render a file through an ordered stage list,
//! and transcode a lossless file into a lossy deliverable.

use crate::error::RenderError;
use async_trait::async_trait;
use mastering_core::FilterStage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lossless intermediate format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LosslessFormat {
    pub sample_rate: u32,
    pub bit_depth: u16,
}

impl LosslessFormat {
    /// File extension, also the engine's container name
    pub fn extension(&self) -> &'static str {
        "wav"
    }
}

impl Default for LosslessFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            bit_depth: 24,
        }
    }
}

/// Lossy distribution format (MP3, constant bitrate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionFormat {
    pub bitrate_kbps: u32,
}

impl DistributionFormat {
    /// File extension, also the engine's container name
    pub fn extension(&self) -> &'static str {
        "mp3"
    }
}

impl Default for DistributionFormat {
    fn default() -> Self {
        Self { bitrate_kbps: 320 }
    }
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Run a loudness measurement over the whole file and return the
    /// engine's diagnostic text
    async fn measure(&self, input: &Path) -> Result<String, RenderError>;

    /// Render `input` through `stages`, in order, into `output`
    async fn render(
        &self,
        input: &Path,
        output: &Path,
        stages: &[FilterStage],
        format: LosslessFormat,
    ) -> Result<(), RenderError>;

    /// Encode a lossless file into the distribution format
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: DistributionFormat,
    ) -> Result<(), RenderError>;
}
