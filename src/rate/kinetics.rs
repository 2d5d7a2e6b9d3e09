//! Resolution of a gate's transitions into the functions used to fill its tables.

use std::sync::Arc;
use log::debug;
use crate::document::Element;
use crate::error::{ChannelTablesError, ConfigurationError, EvaluationError, Locate};
use crate::expression::Expression;
use super::{RateContext, RateFunction};


/// Kinetics of a gate that only depends on voltage
#[derive(Debug, Clone)]
pub struct VoltageKinetics {
    /// Forward transition if declared
    pub alpha: Option<RateFunction>,
    /// Backward transition if declared
    pub beta: Option<RateFunction>,
    /// Time constant before Q10 scaling
    pub tau: RateFunction,
    /// Steady state
    pub inf: RateFunction,
    /// Q10 factor dividing the time constant
    pub q10: f64,
}

impl VoltageKinetics {
    /// Temperature scaled time constant `tau(v) / q10` (document units)
    pub fn time_constant(&self, v: f64) -> Result<f64, EvaluationError> {
        Ok(self.tau.evaluate(v, None)? / self.q10)
    }

    /// Steady state value `inf(v)`
    pub fn steady_state(&self, v: f64) -> Result<f64, EvaluationError> {
        self.inf.evaluate(v, None)
    }
}

/// Kinetics of a gate depending on voltage and an ion concentration
#[derive(Debug, Clone)]
pub struct ConcentrationKinetics {
    /// Forward transition
    pub alpha: RateFunction,
    /// Backward transition
    pub beta: RateFunction,
    /// Q10 factor multiplying both transitions
    pub q10: f64,
}

impl ConcentrationKinetics {
    /// Temperature scaled `(alpha, beta)` at a voltage and concentration (document units)
    pub fn rates(&self, v: f64, concentration: f64) -> Result<(f64, f64), EvaluationError> {
        let alpha = self.alpha.evaluate(v, Some(concentration))? * self.q10;
        let beta = self.beta.evaluate(v, Some(concentration))? * self.q10;

        Ok((alpha, beta))
    }
}

/// Resolved kinetics of a gate
#[derive(Debug, Clone)]
pub enum GateKinetics {
    Voltage(VoltageKinetics),
    Concentration(ConcentrationKinetics),
}

impl GateKinetics {
    /// Q10 factor of the gate
    pub fn q10(&self) -> f64 {
        match self {
            GateKinetics::Voltage(kinetics) => kinetics.q10,
            GateKinetics::Concentration(kinetics) => kinetics.q10,
        }
    }

    /// Forward transition if resolved
    pub fn alpha(&self) -> Option<&RateFunction> {
        match self {
            GateKinetics::Voltage(kinetics) => kinetics.alpha.as_ref(),
            GateKinetics::Concentration(kinetics) => Some(&kinetics.alpha),
        }
    }

    /// Backward transition if resolved
    pub fn beta(&self) -> Option<&RateFunction> {
        match self {
            GateKinetics::Voltage(kinetics) => kinetics.beta.as_ref(),
            GateKinetics::Concentration(kinetics) => Some(&kinetics.beta),
        }
    }

    /// Resolves the transitions of a `gate` element, voltage gates also resolve
    /// `time_course` and `steady_state`, synthesizing `1/(alpha+beta)` and
    /// `alpha/(alpha+beta)` when they are absent
    pub fn resolve(
        gate: &Element,
        context: &Arc<RateContext>,
        q10: f64,
    ) -> Result<Self, ChannelTablesError> {
        let (alpha, beta) = resolve_transitions(gate, context)?;

        if context.concentration_variable.is_some() {
            return match (alpha, beta) {
                (Some(alpha), Some(beta)) => Ok(
                    GateKinetics::Concentration(ConcentrationKinetics { alpha, beta, q10 })
                ),
                _ => Err(ConfigurationError::MissingTransitions.into()),
            };
        }

        let tau = resolve_or_synthesize(
            gate, "time_course", "1/(alpha+beta)", context, alpha.as_ref(), beta.as_ref()
        ).within(|| String::from("time course"))?;
        let inf = resolve_or_synthesize(
            gate, "steady_state", "alpha/(alpha+beta)", context, alpha.as_ref(), beta.as_ref()
        ).within(|| String::from("steady state"))?;

        Ok(GateKinetics::Voltage(VoltageKinetics { alpha, beta, tau, inf, q10 }))
    }
}

fn sibling_references(element: &Element) -> Vec<&'static str> {
    let names = match (element.attribute("expr_form"), element.attribute("expr")) {
        (Some("generic"), Some(text)) => Expression::compile(text)
            .map(|expression| expression.referenced_names())
            .unwrap_or_default(),
        _ => vec![],
    };

    ["alpha", "beta"].into_iter()
        .filter(|sibling| names.iter().any(|name| name == sibling))
        .collect()
}

fn check_references(
    element: &Element,
    alpha: Option<&RateFunction>,
    beta: Option<&RateFunction>,
) -> Result<(), ConfigurationError> {
    for sibling in sibling_references(element) {
        let resolved = match sibling {
            "alpha" => alpha.is_some(),
            _ => beta.is_some(),
        };
        if !resolved {
            return Err(ConfigurationError::UndefinedTransition(String::from(sibling)));
        }
    }

    Ok(())
}

// transitions can reference each other in any document order, each one is built
// once the siblings it references are built
fn resolve_transitions(
    gate: &Element,
    context: &Arc<RateContext>,
) -> Result<(Option<RateFunction>, Option<RateFunction>), ChannelTablesError> {
    let mut pending: Vec<(String, &Element)> = vec![];
    for transition in gate.children_named("transition") {
        let name = transition.required_attribute("name")?;
        if name != "alpha" && name != "beta" {
            return Err(ConfigurationError::UnsupportedTransition(String::from(name)).into());
        }

        // a repeated transition replaces the earlier definition
        pending.retain(|(existing, _)| existing != name);
        pending.push((String::from(name), transition));
    }

    let mut alpha: Option<RateFunction> = None;
    let mut beta: Option<RateFunction> = None;

    while !pending.is_empty() {
        let ready = pending.iter()
            .position(|(_, element)| {
                sibling_references(element).iter()
                    .all(|sibling| !pending.iter().any(|(name, _)| name == sibling))
            });

        let (name, element) = match ready {
            Some(index) => pending.remove(index),
            None => return Err(ConfigurationError::CyclicTransitions(
                pending.iter().map(|(name, _)| name.clone()).collect()
            ).into()),
        };

        let function = check_references(element, alpha.as_ref(), beta.as_ref())
            .map_err(ChannelTablesError::from)
            .and_then(|_| RateFunction::from_element(element, context, alpha.as_ref(), beta.as_ref()))
            .within(|| format!("transition '{}'", name))?;

        debug!("resolved transition {} as {:?}", name, function.form());

        if name == "alpha" {
            alpha = Some(function);
        } else {
            beta = Some(function);
        }
    }

    Ok((alpha, beta))
}

fn resolve_or_synthesize(
    gate: &Element,
    element_name: &str,
    default_expression: &str,
    context: &Arc<RateContext>,
    alpha: Option<&RateFunction>,
    beta: Option<&RateFunction>,
) -> Result<RateFunction, ChannelTablesError> {
    match gate.child(element_name) {
        Some(element) => {
            check_references(element, alpha, beta)?;
            RateFunction::from_element(element, context, alpha, beta)
        },
        None => {
            if alpha.is_none() || beta.is_none() {
                return Err(ConfigurationError::MissingTransitions.into());
            }

            Ok(RateFunction::generic(default_expression, context, alpha, beta)?)
        },
    }
}
