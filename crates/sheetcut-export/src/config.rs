use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every file format the host application can export to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Skp,
    Stl,
    Obj,
    #[default]
    Dxf,
    Svg,
}

impl FileFormat {
    /// Formats this exporter knows how to write.
    pub const SUPPORTED_2D: [FileFormat; 2] = [FileFormat::Dxf, FileFormat::Svg];

    #[must_use]
    pub fn is_supported_2d(self) -> bool {
        Self::SUPPORTED_2D.contains(&self)
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Skp => "skp",
            Self::Stl => "stl",
            Self::Obj => "obj",
            Self::Dxf => "dxf",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skp" => Ok(Self::Skp),
            "stl" => Ok(Self::Stl),
            "obj" => Ok(Self::Obj),
            "dxf" => Ok(Self::Dxf),
            "svg" => Ok(Self::Svg),
            _ => Err(ConfigError::UnknownName {
                what: "file format",
                value: s.to_string(),
            }),
        }
    }
}

/// 24-bit color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Value of the DXF true-color group (420).
    #[must_use]
    pub fn true_color(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor {
            value: s.to_string(),
        };
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

/// The four drawing layers, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Sheet,
    Parts,
    Leftovers,
    Cuts,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Sheet, Layer::Parts, Layer::Leftovers, Layer::Cuts];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sheet => "OCL_SHEET",
            Self::Parts => "OCL_PARTS",
            Self::Leftovers => "OCL_LEFTOVERS",
            Self::Cuts => "OCL_CUTS",
        }
    }

    /// AutoCAD color index used for the DXF layer table.
    #[must_use]
    pub fn aci_color(self) -> u8 {
        match self {
            Self::Sheet => 150,
            Self::Parts => 7,
            Self::Leftovers => 8,
            Self::Cuts => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerStyle {
    pub hidden: bool,
    pub stroke_color: Option<Color>,
    pub fill_color: Option<Color>,
}

impl LayerStyle {
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    Name,
    #[default]
    Number,
}

/// Immutable rendering options for one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub file_format: FileFormat,
    pub sheet: LayerStyle,
    pub parts: LayerStyle,
    pub leftovers: LayerStyle,
    pub cuts: LayerStyle,
    /// Emit native arcs instead of chord approximations.
    pub smoothing: bool,
    pub label_source: LabelSource,
    /// 1-based starting indices of sheet groups to leave out.
    pub hidden_sheet_indices: BTreeSet<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            file_format: FileFormat::default(),
            sheet: LayerStyle::default(),
            parts: LayerStyle::default(),
            leftovers: LayerStyle::hidden(),
            cuts: LayerStyle::hidden(),
            smoothing: false,
            label_source: LabelSource::default(),
            hidden_sheet_indices: BTreeSet::new(),
        }
    }
}

impl RenderConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a config file, picking the parser from the extension (`.json` or YAML).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    #[must_use]
    pub fn style(&self, layer: Layer) -> &LayerStyle {
        match layer {
            Layer::Sheet => &self.sheet,
            Layer::Parts => &self.parts,
            Layer::Leftovers => &self.leftovers,
            Layer::Cuts => &self.cuts,
        }
    }

    /// Layers to draw, in emission order.
    #[must_use]
    pub fn visible_layers(&self) -> Vec<Layer> {
        Layer::ALL
            .into_iter()
            .filter(|layer| !self.style(*layer).hidden)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hide_leftovers_and_cuts() {
        let config = RenderConfig::default();
        assert_eq!(config.file_format, FileFormat::Dxf);
        assert_eq!(config.label_source, LabelSource::Number);
        assert!(!config.smoothing);
        assert_eq!(config.visible_layers(), vec![Layer::Sheet, Layer::Parts]);
    }

    #[test]
    fn yaml_overrides_merge_with_defaults() {
        let config = RenderConfig::from_yaml_str(
            "file_format: svg\nsmoothing: true\ncuts:\n  stroke_color: '#FF0000'\nhidden_sheet_indices: [2, 5]\n",
        )
        .unwrap();
        assert_eq!(config.file_format, FileFormat::Svg);
        assert!(config.smoothing);
        assert!(!config.cuts.hidden);
        assert_eq!(config.cuts.stroke_color, Some(Color::rgb(255, 0, 0)));
        assert!(config.leftovers.hidden);
        assert_eq!(
            config.hidden_sheet_indices.iter().copied().collect::<Vec<_>>(),
            vec![2, 5]
        );
    }

    #[test]
    fn json_config_is_accepted() {
        let config =
            RenderConfig::from_json_str(r##"{"label_source":"name","parts":{"fill_color":"#00ff00"}}"##)
                .unwrap();
        assert_eq!(config.label_source, LabelSource::Name);
        assert_eq!(config.parts.fill_color, Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn malformed_colors_are_rejected() {
        for bad in ["red", "#12345", "#gg0000", "123456"] {
            assert!(bad.parse::<Color>().is_err(), "{bad}");
        }
        assert!(RenderConfig::from_yaml_str("sheet:\n  stroke_color: blue\n").is_err());
    }

    #[test]
    fn color_round_trips_as_lowercase_hex() {
        let c: Color = "#A0b1C2".parse().unwrap();
        assert_eq!(c.to_string(), "#a0b1c2");
        assert_eq!(c.true_color(), 0xa0b1c2);
    }

    #[test]
    fn only_dxf_and_svg_are_supported() {
        for format in [FileFormat::Skp, FileFormat::Stl, FileFormat::Obj] {
            assert!(!format.is_supported_2d());
        }
        assert!(FileFormat::Dxf.is_supported_2d());
        assert_eq!("SVG".parse::<FileFormat>().unwrap(), FileFormat::Svg);
    }
}
