#[cfg(feature = "generate-docs")]
pub mod docs;
pub mod format;

use anyhow::{Context, Result};
use serde_json::Value;

pub fn render_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode output")
}
