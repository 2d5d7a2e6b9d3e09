use log::info;
use crate::document::Element;
use crate::error::ConfigurationError;
use crate::units::UnitScale;


/// A double exponential synapse, values are in SI units
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseModel {
    pub name: String,
    /// Reversal potential (V)
    pub reversal_potential: f64,
    /// Maximal conductance (S)
    pub max_conductance: f64,
    /// Rise time constant (s)
    pub rise_time: f64,
    /// Decay time constant (s)
    pub decay_time: f64,
    /// Whether the synapse is graded rather than spike driven
    pub graded: bool,
    /// Whether magnesium block is modeled
    pub mg_block: bool,
}

impl SynapseModel {
    /// Reads a `synapse_type` element with a `doub_exp_syn` child
    pub fn from_element(element: &Element, units: &UnitScale) -> Result<Self, ConfigurationError> {
        let name = element.required_attribute("name")?;
        let kinetics = element.required_child("doub_exp_syn")?;

        let synapse = SynapseModel {
            name: String::from(name),
            reversal_potential: units.normalize_voltage(kinetics.parse_f64("reversal_potential")?),
            max_conductance: units.normalize_synaptic_conductance(kinetics.parse_f64("max_conductance")?),
            rise_time: units.normalize_time(kinetics.parse_f64("rise_time")?),
            decay_time: units.normalize_time(kinetics.parse_f64("decay_time")?),
            graded: false,
            mg_block: false,
        };

        info!("loading synapse {} into library", name);

        Ok(synapse)
    }
}
