//! Compiler settings read from TOML, such as the simulation temperature and the
//! default table grid.

use std::{fs::read_to_string, path::Path};
use toml::{from_str, Value};
use crate::error::ConfigurationError;


/// Default minimum of the voltage grid (V)
pub const VMIN: f64 = -0.1;
/// Default maximum of the voltage grid (V)
pub const VMAX: f64 = 0.1;
/// Default number of voltage divisions
pub const NDIVS: usize = 200;
/// Default number of concentration divisions
pub const CA_NDIVS: usize = 100;

/// Settings shared by every model compiled from a document
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    /// Simulation temperature (celsius), used for Q10 scaling and bound as `celsius`
    pub temperature: f64,
    /// Default voltage grid minimum (V) when a channel has no table settings
    pub v_min: f64,
    /// Default voltage grid maximum (V) when a channel has no table settings
    pub v_max: f64,
    /// Default number of voltage divisions
    pub v_divisions: usize,
    /// Number of concentration divisions for concentration dependent gates
    pub conc_divisions: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            temperature: 6.3,
            v_min: VMIN,
            v_max: VMAX,
            v_divisions: NDIVS,
            conc_divisions: CA_NDIVS,
        }
    }
}

fn settings_error(message: String) -> ConfigurationError {
    ConfigurationError::InvalidSettings(message)
}

fn parse_f64(value: &Value, field_name: &str) -> Result<f64, ConfigurationError> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Integer(x) => Ok(*x as f64),
        _ => Err(settings_error(format!("Cannot parse {} as float", field_name))),
    }
}

fn parse_usize(value: &Value, field_name: &str) -> Result<usize, ConfigurationError> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .ok_or_else(|| settings_error(format!("Cannot parse {} as unsigned integer", field_name)))
        .map(|v| v as usize)
}

fn parse_value_with_default<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T, ConfigurationError>,
    default: T,
) -> Result<T, ConfigurationError> {
    table
        .get(key)
        .map_or(Ok(default), |value| parser(value, key))
}

impl CompilerSettings {
    /// Reads settings from a TOML string, keys may be at the top level or
    /// under a `[compiler]` table, missing keys use the defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let value: Value = from_str(text)
            .map_err(|e| settings_error(e.to_string()))?;
        let table = value.get("compiler").unwrap_or(&value);

        let defaults = CompilerSettings::default();

        let settings = CompilerSettings {
            temperature: parse_value_with_default(table, "temperature", parse_f64, defaults.temperature)?,
            v_min: parse_value_with_default(table, "v_min", parse_f64, defaults.v_min)?,
            v_max: parse_value_with_default(table, "v_max", parse_f64, defaults.v_max)?,
            v_divisions: parse_value_with_default(table, "v_divisions", parse_usize, defaults.v_divisions)?,
            conc_divisions: parse_value_with_default(table, "conc_divisions", parse_usize, defaults.conc_divisions)?,
        };

        settings.check()?;

        Ok(settings)
    }

    /// Reads settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let text = read_to_string(path.as_ref())
            .map_err(|e| settings_error(format!("{}: {}", path.as_ref().display(), e)))?;

        CompilerSettings::from_toml_str(&text)
    }

    /// Checks that the default grids can be sampled
    pub fn check(&self) -> Result<(), ConfigurationError> {
        if self.v_divisions == 0 || self.conc_divisions == 0 {
            return Err(settings_error(String::from("Division counts must be positive")));
        }
        if self.v_max <= self.v_min {
            return Err(settings_error(String::from("v_max must be greater than v_min")));
        }

        Ok(())
    }
}
