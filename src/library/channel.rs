//! Channel models and their gates.

use std::sync::Arc;
use log::{debug, info};
use crate::document::Element;
use crate::error::{ChannelTablesError, ConfigurationError, Locate};
use crate::q10::gate_q10_factor;
use crate::rate::{RateContext, kinetics::GateKinetics};
use crate::settings::CompilerSettings;
use crate::tables::{
    GateTable, TableAxis, tabulate_voltage, tabulate_voltage_concentration,
};
use crate::units::UnitScale;


/// Maximum number of gates on a channel
pub const MAX_GATES: usize = 3;

/// Current-voltage relation of a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConductanceLaw {
    Ohmic,
    Other(String),
}

impl ConductanceLaw {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ohmic" => ConductanceLaw::Ohmic,
            other => ConductanceLaw::Other(String::from(other)),
        }
    }
}

/// Gate slot of a channel, gates fill the slots in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateSlot {
    X,
    Y,
    Z,
}

impl GateSlot {
    /// Slot of the gate at the given position, `None` past the third gate
    pub fn from_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(GateSlot::X),
            1 => Some(GateSlot::Y),
            2 => Some(GateSlot::Z),
            _ => None,
        }
    }
}

/// Quantities a gate table is indexed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateIndex {
    /// Voltage only
    Voltage,
    /// Voltage and the first concentration input
    VoltageConcentration,
}

/// Concentration dependence shared by every gate of a channel
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationDependence {
    /// Ion the channel depends on
    pub ion: String,
    /// Identifier bound to the concentration in expressions
    pub variable_name: String,
    /// Concentration grid (document units)
    pub axis: TableAxis,
}

impl ConcentrationDependence {
    /// Reads a `conc_dependence` element, sampling `divisions` steps between
    /// `min_conc` and `max_conc`
    ///
    /// `max_conc` must be strictly greater than `min_conc`, a flat or descending
    /// grid is rejected with [`ConfigurationError::InvalidGrid`] rather than
    /// tabulated with a zero or negative step
    pub fn from_element(element: &Element, divisions: usize) -> Result<Self, ConfigurationError> {
        Ok(ConcentrationDependence {
            ion: String::from(element.required_attribute("ion")?),
            variable_name: String::from(element.required_attribute("variable_name")?),
            axis: TableAxis::new(
                element.parse_f64("min_conc")?,
                element.parse_f64("max_conc")?,
                divisions,
            )?,
        })
    }
}

/// A compiled gate of a channel
#[derive(Debug, Clone)]
pub struct Gate {
    pub name: String,
    pub slot: GateSlot,
    /// Power the gate variable is raised to
    pub power: f64,
    /// Q10 factor applied to the kinetics
    pub q10: f64,
    pub index: GateIndex,
    /// Whether consumers should interpolate between table entries
    pub use_interpolation: bool,
    pub kinetics: GateKinetics,
    pub table: GateTable,
}

/// A compiled channel, conductance and reversal potential are in SI units
#[derive(Debug, Clone)]
pub struct ChannelModel {
    pub name: String,
    pub conductance_law: ConductanceLaw,
    /// Maximal conductance density (S/m^2), only set for ohmic channels
    pub gmax: Option<f64>,
    /// Reversal potential (V), only set for ohmic channels
    pub erev: Option<f64>,
    /// Ion carried by the channel
    pub ion: Option<String>,
    /// Ion the gates depend on
    pub ion_dependency: Option<String>,
    pub concentration_dependence: Option<ConcentrationDependence>,
    /// Gates in slot order
    pub gates: Vec<Gate>,
}

impl ChannelModel {
    /// Gate with the given name
    pub fn gate(&self, name: &str) -> Option<&Gate> {
        self.gates.iter().find(|gate| gate.name == name)
    }

    /// Gate bound to the given slot
    pub fn gate_in_slot(&self, slot: GateSlot) -> Option<&Gate> {
        self.gates.iter().find(|gate| gate.slot == slot)
    }

    /// Compiles a `channel_type` element, values are read in document units
    /// described by `units` and stored in SI units
    pub fn from_element(
        element: &Element,
        units: &UnitScale,
        settings: &CompilerSettings,
    ) -> Result<Self, ChannelTablesError> {
        let name = element.required_attribute("name")?;
        let relation = element.required_child("current_voltage_relation")?;

        let gate_elements: Vec<&Element> = relation.children_named("gate").collect();
        if gate_elements.len() > MAX_GATES {
            return Err(ConfigurationError::TooManyGates(gate_elements.len()).into());
        }

        let conductance_law = ConductanceLaw::from_name(relation.required_attribute("cond_law")?);
        let (gmax, erev) = match conductance_law {
            ConductanceLaw::Ohmic => (
                Some(units.normalize_conductance(relation.parse_f64("default_gmax")?)),
                Some(units.normalize_voltage(relation.parse_f64("default_erev")?)),
            ),
            ConductanceLaw::Other(_) => (None, None),
        };

        let concentration_dependence = relation.child("conc_dependence")
            .map(|dependence| ConcentrationDependence::from_element(dependence, settings.conc_divisions))
            .transpose()?;

        let voltage = voltage_grid(element, units, settings)?;
        let offset = match relation.child("offset") {
            Some(offset) => offset.parse_f64("value")?,
            None => 0.,
        };

        debug!(
            "channel {} voltage grid: {} to {} in {} divisions, offset {}",
            name, voltage.min, voltage.max, voltage.divisions, offset,
        );

        let parameters = element.descendants_named("parameter")
            .into_iter()
            .map(|parameter| -> Result<(String, f64), ConfigurationError> {
                Ok((
                    String::from(parameter.required_attribute("name")?),
                    parameter.parse_f64("value")?,
                ))
            })
            .collect::<Result<Vec<(String, f64)>, ConfigurationError>>()?;

        let layout = GateLayout {
            relation,
            voltage,
            offset,
            parameters: &parameters,
            concentration: concentration_dependence.as_ref(),
            units,
            settings,
        };

        let gates = gate_elements.iter()
            .enumerate()
            .map(|(position, gate)| {
                let gate_name = gate.attribute("name").unwrap_or("unnamed");
                layout.build_gate(gate, position)
                    .within(|| format!("gate '{}'", gate_name))
            })
            .collect::<Result<Vec<Gate>, ChannelTablesError>>()?;

        info!("loading channel {} into library", name);

        Ok(ChannelModel {
            name: String::from(name),
            conductance_law,
            gmax,
            erev,
            ion: relation.attribute("ion").map(String::from),
            ion_dependency: concentration_dependence.as_ref().map(|dependence| dependence.ion.clone()),
            concentration_dependence,
            gates,
        })
    }
}

// grid from `impl_prefs/table_settings` if present, otherwise the default grid
// converted from SI to document units
fn voltage_grid(
    channel: &Element,
    units: &UnitScale,
    settings: &CompilerSettings,
) -> Result<TableAxis, ConfigurationError> {
    match channel.child("impl_prefs") {
        Some(preferences) => {
            let table_settings = preferences.required_child("table_settings")?;

            TableAxis::new(
                table_settings.parse_f64("min_v")?,
                table_settings.parse_f64("max_v")?,
                table_settings.parse_usize("table_divisions")?,
            )
        },
        None => TableAxis::new(
            units.denormalize_voltage(settings.v_min),
            units.denormalize_voltage(settings.v_max),
            settings.v_divisions,
        ),
    }
}

struct GateLayout<'a> {
    relation: &'a Element,
    voltage: TableAxis,
    offset: f64,
    parameters: &'a [(String, f64)],
    concentration: Option<&'a ConcentrationDependence>,
    units: &'a UnitScale,
    settings: &'a CompilerSettings,
}

impl GateLayout<'_> {
    fn build_gate(&self, element: &Element, position: usize) -> Result<Gate, ChannelTablesError> {
        let name = element.required_attribute("name")?;
        let slot = GateSlot::from_position(position)
            .ok_or(ConfigurationError::TooManyGates(position + 1))?;
        let power = element.parse_f64("instances")?;

        let q10 = gate_q10_factor(
            self.relation.children_named("q10_settings"),
            name,
            self.settings.temperature,
        )?;

        let context = Arc::new(RateContext::for_gate(
            self.settings.temperature,
            name,
            q10,
            self.parameters,
            self.concentration.map(|dependence| dependence.variable_name.as_str()),
        ));

        let kinetics = GateKinetics::resolve(element, &context, q10)?;

        let (table, index, use_interpolation) = match (&kinetics, self.concentration) {
            (GateKinetics::Voltage(voltage_kinetics), _) => {
                let table = tabulate_voltage(&self.voltage, self.offset, self.units, |v| {
                    Ok((voltage_kinetics.steady_state(v)?, voltage_kinetics.time_constant(v)?))
                })?;

                (GateTable::OneDimensional(table), GateIndex::Voltage, true)
            },
            (GateKinetics::Concentration(concentration_kinetics), Some(dependence)) => {
                let table = tabulate_voltage_concentration(
                    &self.voltage,
                    &dependence.axis,
                    self.offset,
                    self.units,
                    |v, concentration| concentration_kinetics.rates(v, concentration),
                )?;

                (GateTable::TwoDimensional(table), GateIndex::VoltageConcentration, false)
            },
            (GateKinetics::Concentration(_), None) => {
                return Err(ConfigurationError::MissingElement {
                    parent: self.relation.name.clone(),
                    element: String::from("conc_dependence"),
                }.into());
            },
        };

        Ok(Gate {
            name: String::from(name),
            slot,
            power,
            q10,
            index,
            use_interpolation,
            kinetics,
            table,
        })
    }
}
