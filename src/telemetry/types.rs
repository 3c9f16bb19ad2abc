//! OpenHardwareMonitor `data.json` node tree.
//!
//! Every level (root, computer, hardware, sensor group, sensor) shares one shape:
//! `{"Text": ..., "Children": [...], "ImageURL": ..., "Value": ...}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorNode {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "ImageURL")]
    pub image_url: String,
    /// Textual reading such as `"45.0 °C"`. Kept untyped so a stray non-string
    /// value only skips that sensor instead of failing the whole document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub children: Vec<SensorNode>,
}

// Builders for hand-made trees in tests.
#[cfg(test)]
impl SensorNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(serde_json::Value::String(value.into()));
        self
    }

    pub fn with_children(mut self, children: Vec<SensorNode>) -> Self {
        self.children = children;
        self
    }
}
