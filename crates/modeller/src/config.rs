//! Configuration types for diagram composition and canvas layout.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every field has a default, so a partial file is valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`MarkupConfig`] - Note wrapping and default encoder options.
//! - [`CanvasConfig`] - Instance sizes and property stacking geometry.
//! - [`RendererConfig`] - Where encoded tokens are rendered.
//!
//! # Example
//!
//! ```
//! # use modeller::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.markup().note_width(), 40);
//! assert_eq!(config.canvas().property_gap(), 5.0);
//! ```

use serde::Deserialize;

use modeller_core::geometry::Size;

use crate::encoder::EncodeOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    markup: MarkupConfig,

    #[serde(default)]
    canvas: CanvasConfig,

    #[serde(default)]
    renderer: RendererConfig,
}

impl AppConfig {
    pub fn new(markup: MarkupConfig, canvas: CanvasConfig, renderer: RendererConfig) -> Self {
        Self {
            markup,
            canvas,
            renderer,
        }
    }

    /// Returns the markup configuration.
    pub fn markup(&self) -> &MarkupConfig {
        &self.markup
    }

    /// Returns the canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Returns the renderer configuration.
    pub fn renderer(&self) -> &RendererConfig {
        &self.renderer
    }
}

/// Markup generation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Maximum note line width, in characters.
    note_width: usize,

    /// Emit description notes by default.
    include_notes: bool,

    /// Emit property notes by default.
    include_properties: bool,

    /// Reject composites in which two elements share an identifier.
    strict_identifiers: bool,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            note_width: 40,
            include_notes: true,
            include_properties: true,
            strict_identifiers: false,
        }
    }
}

impl MarkupConfig {
    pub fn note_width(&self) -> usize {
        self.note_width
    }

    pub fn strict_identifiers(&self) -> bool {
        self.strict_identifiers
    }

    /// Encoder options built from the configured defaults.
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            include_notes: self.include_notes,
            include_properties: self.include_properties,
        }
    }

    /// Enable or disable strict identifier checking (builder style).
    pub fn with_strict_identifiers(mut self, strict: bool) -> Self {
        self.strict_identifiers = strict;
        self
    }
}

/// Canvas geometry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Property width as a fraction of the parent width.
    property_width_ratio: f32,

    /// Vertical gap between stacked property instances.
    property_gap: f32,

    default_element_width: f32,
    default_element_height: f32,
    default_property_height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            property_width_ratio: 0.9,
            property_gap: 5.0,
            default_element_width: 200.0,
            default_element_height: 100.0,
            default_property_height: 30.0,
        }
    }
}

impl CanvasConfig {
    pub fn property_width_ratio(&self) -> f32 {
        self.property_width_ratio
    }

    pub fn property_gap(&self) -> f32 {
        self.property_gap
    }

    /// Size given to newly placed element instances.
    pub fn default_element_size(&self) -> Size {
        Size::new(self.default_element_width, self.default_element_height)
    }

    pub fn default_property_height(&self) -> f32 {
        self.default_property_height
    }
}

/// Output format requested from the rendering service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Svg,
    Png,
    Txt,
}

impl RenderFormat {
    fn path_segment(self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Png => "png",
            RenderFormat::Txt => "txt",
        }
    }
}

/// Rendering service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    server_url: String,
    format: RenderFormat,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            server_url: "https://www.plantuml.com/plantuml".to_string(),
            format: RenderFormat::Svg,
        }
    }
}

impl RendererConfig {
    /// Build the rendering URL for an encoded token.
    ///
    /// ```
    /// # use modeller::config::RendererConfig;
    /// let url = RendererConfig::default().render_url("SoWkIImgAStDuNBAJrBGjLDmpCbCJbMmKiX8pSd9vt98pKi1IW80");
    /// assert!(url.starts_with("https://www.plantuml.com/plantuml/svg/SoWk"));
    /// ```
    pub fn render_url(&self, token: &str) -> String {
        format!(
            "{}/{}/{}",
            self.server_url.trim_end_matches('/'),
            self.format.path_segment(),
            token
        )
    }
}
