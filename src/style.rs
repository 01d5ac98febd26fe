//! Style document: the root attributes, CSS custom properties and injected
//! style blocks that fonts and themes project onto the front-end.
//!
//! Nothing here is authoritative. The preference store holds the state;
//! this document is recomputed from it and can be rendered to a stylesheet.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Projection of the document root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDocument {
    attributes: BTreeMap<String, String>,
    properties: BTreeMap<String, String>,
    style_blocks: BTreeMap<String, String>,
}

impl StyleDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set a CSS custom property (`--name`)
    pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
        self.properties.insert(name.to_string(), value.into());
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        self.properties.remove(name)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert or replace the style block with `id`
    pub fn inject_style(&mut self, id: &str, css: impl Into<String>) {
        self.style_blocks.insert(id.to_string(), css.into());
    }

    pub fn remove_style(&mut self, id: &str) -> Option<String> {
        self.style_blocks.remove(id)
    }

    pub fn style(&self, id: &str) -> Option<&str> {
        self.style_blocks.get(id).map(String::as_str)
    }

    /// Render as a standalone stylesheet
    pub fn to_css(&self) -> String {
        let mut selector = String::from(":root");
        for (name, value) in &self.attributes {
            selector.push_str(&format!("[{}=\"{}\"]", name, value.replace('"', "\\\"")));
        }

        let mut css = format!("{} {{\n", selector);
        for (name, value) in &self.properties {
            css.push_str(&format!("  {}: {};\n", name, value));
        }
        css.push_str("}\n");

        for (id, block) in &self.style_blocks {
            css.push_str(&format!("\n/* {} */\n{}\n", id, block.trim_end()));
        }
        css
    }

    pub fn write_css(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::write(path, self.to_css()).with_context(|| format!("Failed to write {:?}", path))
    }
}
