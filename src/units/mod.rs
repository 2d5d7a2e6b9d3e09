//! Unit systems of ChannelML documents and the factors that convert document
//! values into SI units.

use crate::error::ConfigurationError;


/// Unit systems a document can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    /// mV, ms, mS/cm^2, mol/cm^3, cm
    Physiological,
    /// V, s, S/m^2, mol/m^3, m
    SI,
}

impl UnitSystem {
    /// Recognizes the document `units` tag, tags containing `Physiological Units`
    /// or `SI Units` are accepted, anything else is an error
    pub fn from_tag(tag: &str) -> Result<Self, ConfigurationError> {
        if tag.contains("Physiological Units") {
            Ok(UnitSystem::Physiological)
        } else if tag.contains("SI Units") {
            Ok(UnitSystem::SI)
        } else {
            Err(ConfigurationError::UnsupportedUnitSystem(String::from(tag)))
        }
    }

    /// Scale factors for this unit system
    pub fn scale(&self) -> UnitScale {
        match self {
            UnitSystem::Physiological => UnitScale {
                voltage: 1e-3,
                time: 1e-3,
                conductance: 1e1,
                synaptic_conductance: 1e-3,
                concentration: 1e6,
                length: 1e-2,
            },
            UnitSystem::SI => UnitScale::identity(),
        }
    }
}

/// Multiplicative factors taking document values to SI values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    /// V from document voltage
    pub voltage: f64,
    /// s from document time
    pub time: f64,
    /// S/m^2 from document conductance density
    pub conductance: f64,
    /// S from document absolute conductance (synapses)
    pub synaptic_conductance: f64,
    /// mol/m^3 from document concentration
    pub concentration: f64,
    /// m from document length
    pub length: f64,
}

impl Default for UnitScale {
    fn default() -> Self {
        UnitScale::identity()
    }
}

impl UnitScale {
    /// Scale where every factor is one
    pub fn identity() -> Self {
        UnitScale {
            voltage: 1.,
            time: 1.,
            conductance: 1.,
            synaptic_conductance: 1.,
            concentration: 1.,
            length: 1.,
        }
    }

    /// Looks up the scale for a document `units` tag
    pub fn from_tag(tag: &str) -> Result<Self, ConfigurationError> {
        Ok(UnitSystem::from_tag(tag)?.scale())
    }

    /// Converts a document voltage to volts
    pub fn normalize_voltage(&self, value: f64) -> f64 { value * self.voltage }
    /// Converts volts back to document voltage
    pub fn denormalize_voltage(&self, value: f64) -> f64 { value / self.voltage }

    /// Converts a document time to seconds
    pub fn normalize_time(&self, value: f64) -> f64 { value * self.time }
    /// Converts seconds back to document time
    pub fn denormalize_time(&self, value: f64) -> f64 { value / self.time }

    /// Converts a document conductance density to S/m^2
    pub fn normalize_conductance(&self, value: f64) -> f64 { value * self.conductance }
    /// Converts S/m^2 back to document conductance density
    pub fn denormalize_conductance(&self, value: f64) -> f64 { value / self.conductance }

    /// Converts a document synaptic conductance to S
    pub fn normalize_synaptic_conductance(&self, value: f64) -> f64 { value * self.synaptic_conductance }
    /// Converts S back to document synaptic conductance
    pub fn denormalize_synaptic_conductance(&self, value: f64) -> f64 { value / self.synaptic_conductance }

    /// Converts a document concentration to mol/m^3
    pub fn normalize_concentration(&self, value: f64) -> f64 { value * self.concentration }
    /// Converts mol/m^3 back to document concentration
    pub fn denormalize_concentration(&self, value: f64) -> f64 { value / self.concentration }

    /// Converts a document length to meters
    pub fn normalize_length(&self, value: f64) -> f64 { value * self.length }
    /// Converts meters back to document length
    pub fn denormalize_length(&self, value: f64) -> f64 { value / self.length }

    /// Converts a document rate (per document time unit) to a rate per second
    pub fn normalize_rate(&self, value: f64) -> f64 { value / self.time }
}
