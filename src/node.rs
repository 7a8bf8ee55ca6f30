//! The `ExtractKeyColors` dataflow node.
//!
//! The node owns two fixed inputs, `input_image` and `num_colors`. Each call to
//! [`ExtractKeyColors::process`] replaces the previous run's outputs with one
//! `color_<n>` parameter per extracted color, carrying the hex value and a
//! color picker trait.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::color::Color;
use crate::config::{ExtractOptions, MAX_NUM_COLORS, MIN_NUM_COLORS};
use crate::error::{KeyColorsError, Result};
use crate::extract::{KeyColor, extract_key_colors};
use crate::source::{ImageSource, SUPPORTED_EXTENSIONS};

pub const INPUT_IMAGE: &str = "input_image";
pub const NUM_COLORS: &str = "num_colors";
pub const COLOR_PREFIX: &str = "color_";

pub const MIN_COLORS: i64 = MIN_NUM_COLORS as i64;
pub const MAX_COLORS: i64 = MAX_NUM_COLORS as i64;
pub const DEFAULT_COLORS: i64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterMode {
    Input,
    Output,
    Property,
}

/// UI hints attached to a parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "trait", rename_all = "snake_case")]
pub enum ParameterTrait {
    Slider {
        min_val: i64,
        max_val: i64,
    },
    ColorPicker {
        format: String,
    },
    FileBrowser {
        extensions: Vec<String>,
        allow_multiple: bool,
        allow_directories: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Int(i64),
    Str(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub tooltip: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_types: Vec<String>,
    pub allowed_modes: Vec<ParameterMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<ParameterTrait>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Parameter {
    fn input_image() -> Self {
        Self {
            name: INPUT_IMAGE.to_string(),
            tooltip: "The image to extract key colors from".to_string(),
            type_name: "ImageUrlArtifact".to_string(),
            input_types: vec!["ImageUrlArtifact".to_string(), "ImageArtifact".to_string()],
            allowed_modes: vec![ParameterMode::Input, ParameterMode::Property],
            default_value: None,
            traits: vec![ParameterTrait::FileBrowser {
                extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
                allow_multiple: false,
                allow_directories: false,
            }],
            display_name: Some("Input Image".to_string()),
        }
    }

    fn num_colors() -> Self {
        Self {
            name: NUM_COLORS.to_string(),
            tooltip: "Target number of colors to extract".to_string(),
            type_name: "int".to_string(),
            input_types: Vec::new(),
            allowed_modes: vec![ParameterMode::Input, ParameterMode::Property],
            default_value: Some(DefaultValue::Int(DEFAULT_COLORS)),
            traits: vec![ParameterTrait::Slider {
                min_val: MIN_COLORS,
                max_val: MAX_COLORS,
            }],
            display_name: Some("Target Number of Colors".to_string()),
        }
    }

    fn color_output(index: usize, hex: String) -> Self {
        Self {
            name: color_parameter_name(index),
            tooltip: "Hex color".to_string(),
            type_name: "str".to_string(),
            input_types: Vec::new(),
            allowed_modes: vec![ParameterMode::Property, ParameterMode::Output],
            default_value: Some(DefaultValue::Str(hex)),
            traits: vec![ParameterTrait::ColorPicker {
                format: "hex".to_string(),
            }],
            display_name: None,
        }
    }
}

/// `color_1`, `color_2`, ...
pub fn color_parameter_name(index: usize) -> String {
    format!("{COLOR_PREFIX}{index}")
}

/// The 1-based index of a `color_<n>` parameter name.
pub fn color_parameter_index(name: &str) -> Option<usize> {
    name.strip_prefix(COLOR_PREFIX)?
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParameterValue {
    Image(ImageSource),
    Int(i64),
    Str(String),
}

#[derive(Debug)]
pub struct ExtractKeyColors {
    parameters: Vec<Parameter>,
    values: HashMap<String, ParameterValue>,
    output_values: HashMap<String, ParameterValue>,
    options: ExtractOptions,
    color_parameter_count: usize,
}

impl Default for ExtractKeyColors {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractKeyColors {
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    /// `options.num_colors` is ignored; the `num_colors` parameter decides.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            parameters: vec![Parameter::input_image(), Parameter::num_colors()],
            values: HashMap::new(),
            output_values: HashMap::new(),
            options,
            color_parameter_count: 0,
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn color_parameter_count(&self) -> usize {
        self.color_parameter_count
    }

    pub fn set_parameter_value(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        if self.parameter(name).is_none() {
            return Err(KeyColorsError::UnknownParameter(name.to_string()));
        }
        let value = match (name, value) {
            (INPUT_IMAGE, ParameterValue::Image(source)) => ParameterValue::Image(source),
            (INPUT_IMAGE, ParameterValue::Str(path)) => ParameterValue::Image(ImageSource::File(path.into())),
            (NUM_COLORS, ParameterValue::Int(n)) => ParameterValue::Int(n),
            (_, ParameterValue::Str(hex)) if color_parameter_index(name).is_some() => {
                let value = ParameterValue::Str(hex.parse::<Color>()?.hex());
                self.output_values.insert(name.to_string(), value.clone());
                value
            }
            (_, other) => return Err(KeyColorsError::invalid_parameter(name, format!("{other:?}"))),
        };
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// The explicitly set value, falling back to the parameter's default.
    pub fn parameter_value(&self, name: &str) -> Option<ParameterValue> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        match self.parameter(name)?.default_value.as_ref()? {
            DefaultValue::Int(n) => Some(ParameterValue::Int(*n)),
            DefaultValue::Str(s) => Some(ParameterValue::Str(s.clone())),
        }
    }

    pub fn output_value(&self, name: &str) -> Option<&ParameterValue> {
        self.output_values.get(name)
    }

    /// `(name, hex)` for every color output of the last run, in rank order.
    pub fn color_outputs(&self) -> Vec<(String, String)> {
        (1..=self.color_parameter_count)
            .filter_map(|i| {
                let name = color_parameter_name(i);
                match self.parameter_value(&name)? {
                    ParameterValue::Str(hex) => Some((name, hex)),
                    _ => None,
                }
            })
            .collect()
    }

    /// Remove every `color_<n>` parameter along with its values.
    pub fn clear_color_parameters(&mut self) {
        let stale: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| color_parameter_index(&p.name).is_some())
            .map(|p| p.name.clone())
            .collect();
        for name in &stale {
            debug!("removing existing parameter: {name}");
            self.values.remove(name);
            self.output_values.remove(name);
        }
        self.parameters.retain(|p| color_parameter_index(&p.name).is_none());
        self.color_parameter_count = 0;
    }

    /// Extract key colors from `input_image` and publish them as `color_<n>`
    /// outputs.
    pub fn process(&mut self) -> Result<Vec<KeyColor>> {
        self.clear_color_parameters();

        let source = match self.values.get(INPUT_IMAGE) {
            Some(ParameterValue::Image(source)) => source.clone(),
            _ => return Err(KeyColorsError::MissingImage),
        };
        let num_colors = match self.parameter_value(NUM_COLORS) {
            Some(ParameterValue::Int(n)) => n,
            _ => DEFAULT_COLORS,
        };
        if !(MIN_COLORS..=MAX_COLORS).contains(&num_colors) {
            return Err(KeyColorsError::invalid_parameter(NUM_COLORS, num_colors));
        }

        debug!(image = %source.describe(), num_colors, "processing image");
        let bytes = source.load_bytes()?;
        let options = ExtractOptions {
            num_colors: num_colors as usize,
            ..self.options.clone()
        };
        let colors = extract_key_colors(&bytes, &options)?;
        debug!("extracted {} colors ordered by prominence", colors.len());

        for (i, key) in colors.iter().enumerate() {
            let hex = key.hex();
            let parameter = Parameter::color_output(i + 1, hex.clone());
            debug!("creating parameter {} with value {hex}", parameter.name);
            self.output_values
                .insert(parameter.name.clone(), ParameterValue::Str(hex));
            self.parameters.push(parameter);
        }
        self.color_parameter_count = colors.len();
        Ok(colors)
    }

    /// JSON description of the node's current parameters.
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "name": "ExtractKeyColors",
            "parameters": self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_has_fixed_inputs() {
        let node = ExtractKeyColors::new();
        let names: Vec<&str> = node.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![INPUT_IMAGE, NUM_COLORS]);
        assert_eq!(node.parameter_value(NUM_COLORS), Some(ParameterValue::Int(3)));
        assert_eq!(node.parameter_value(INPUT_IMAGE), None);
        assert!(matches!(
            node.parameter(NUM_COLORS).unwrap().traits[0],
            ParameterTrait::Slider { min_val: 1, max_val: 12 }
        ));
    }

    #[test]
    fn color_parameter_names() {
        assert_eq!(color_parameter_name(4), "color_4");
        assert_eq!(color_parameter_index("color_12"), Some(12));
        assert_eq!(color_parameter_index("color_0"), None);
        assert_eq!(color_parameter_index("color_x"), None);
        assert_eq!(color_parameter_index(NUM_COLORS), None);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut node = ExtractKeyColors::new();
        let err = node.set_parameter_value("color_1", ParameterValue::Str("#ffffff".into())).unwrap_err();
        assert!(matches!(err, KeyColorsError::UnknownParameter(_)));
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let mut node = ExtractKeyColors::new();
        let err = node.set_parameter_value(NUM_COLORS, ParameterValue::Str("five".into())).unwrap_err();
        assert!(matches!(err, KeyColorsError::InvalidParameter { .. }));
    }

    #[test]
    fn string_input_image_is_a_path() {
        let mut node = ExtractKeyColors::new();
        node.set_parameter_value(INPUT_IMAGE, ParameterValue::Str("photo.png".into())).unwrap();
        assert_eq!(
            node.parameter_value(INPUT_IMAGE),
            Some(ParameterValue::Image(ImageSource::File("photo.png".into())))
        );
    }

    #[test]
    fn process_without_image_fails() {
        let mut node = ExtractKeyColors::new();
        assert!(matches!(node.process(), Err(KeyColorsError::MissingImage)));
    }

    #[test]
    fn out_of_range_num_colors_fails() {
        let mut node = ExtractKeyColors::new();
        node.set_parameter_value(INPUT_IMAGE, ParameterValue::Image(vec![0u8; 200].into())).unwrap();
        for n in [0, 13] {
            node.set_parameter_value(NUM_COLORS, ParameterValue::Int(n)).unwrap();
            assert!(matches!(node.process(), Err(KeyColorsError::InvalidParameter { .. })), "{n}");
        }
    }

    #[test]
    fn describe_lists_parameters() {
        let description = ExtractKeyColors::new().describe();
        assert_eq!(description["name"], "ExtractKeyColors");
        assert_eq!(description["parameters"][0]["type"], "ImageUrlArtifact");
        assert_eq!(description["parameters"][1]["default_value"], 3);
        assert_eq!(description["parameters"][1]["traits"][0]["trait"], "slider");
    }
}
