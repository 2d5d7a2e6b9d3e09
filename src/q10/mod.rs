//! Q10 temperature scaling of gate kinetics.

use log::debug;
use crate::document::Element;
use crate::error::ConfigurationError;


/// Temperature scaling declared by a `q10_settings` element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Q10Setting {
    /// Factor per 10 degrees relative to the temperature the kinetics were measured at
    Reference {
        q10_factor: f64,
        experimental_temp: f64,
    },
    /// Factor applied regardless of temperature
    Fixed(f64),
}

impl Q10Setting {
    /// Reads `q10_factor` with `experimental_temp`, or else `fixed_q10`,
    /// returns `None` when the element has neither
    pub fn from_element(element: &Element) -> Result<Option<Self>, ConfigurationError> {
        if element.has_attribute("q10_factor") {
            Ok(Some(Q10Setting::Reference {
                q10_factor: element.parse_f64("q10_factor")?,
                experimental_temp: element.parse_f64("experimental_temp")?,
            }))
        } else if element.has_attribute("fixed_q10") {
            Ok(Some(Q10Setting::Fixed(element.parse_f64("fixed_q10")?)))
        } else {
            Ok(None)
        }
    }

    /// Multiplicative factor at the given simulation temperature (celsius)
    pub fn factor(&self, temperature: f64) -> f64 {
        match self {
            Q10Setting::Reference { q10_factor, experimental_temp } => {
                q10_factor.powf((temperature - experimental_temp) / 10.)
            },
            Q10Setting::Fixed(factor) => *factor,
        }
    }
}

/// Computes the Q10 factor of a gate from the `q10_settings` elements of its channel,
/// settings without a `gate` attribute apply to every gate, a setting naming the gate
/// applies and stops the search, the factor is 1 when nothing applies
pub fn gate_q10_factor<'a, I>(
    settings: I,
    gate_name: &str,
    temperature: f64,
) -> Result<f64, ConfigurationError>
where
    I: IntoIterator<Item = &'a Element>,
{
    let mut q10 = 1.;

    for element in settings {
        match element.attribute("gate") {
            Some(gate) => {
                if gate == gate_name {
                    if let Some(setting) = Q10Setting::from_element(element)? {
                        q10 = setting.factor(temperature);
                    }
                    break;
                }
            },
            None => {
                if let Some(setting) = Q10Setting::from_element(element)? {
                    q10 = setting.factor(temperature);
                }
            },
        }
    }

    debug!("gate {} q10 factor: {}", gate_name, q10);

    Ok(q10)
}
