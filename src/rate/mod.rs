//! Rate functions of gate transitions, built from the closed form templates
//! (`exponential`, `sigmoid`, `exp_linear`) or from generic expressions.

use std::{collections::HashMap, sync::Arc};
use crate::document::Element;
use crate::error::{ChannelTablesError, ConfigurationError, EvaluationError};
use crate::expression::{Expression, Scope};
pub mod kinetics;


/// Kinds of rate functions selected by the `expr_form` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionForm {
    Exponential,
    Sigmoid,
    ExpLinear,
    Generic,
}

impl ExpressionForm {
    /// Parses an `expr_form` attribute value
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            "exponential" => Ok(ExpressionForm::Exponential),
            "sigmoid" => Ok(ExpressionForm::Sigmoid),
            "exp_linear" => Ok(ExpressionForm::ExpLinear),
            "generic" => Ok(ExpressionForm::Generic),
            _ => Err(ConfigurationError::UnsupportedExpressionForm(String::from(name))),
        }
    }
}

/// Parameters shared by the closed form templates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedForm {
    pub rate: f64,
    pub midpoint: f64,
    pub scale: f64,
}

impl ClosedForm {
    /// Creates template parameters, a zero scale is rejected
    pub fn new(rate: f64, midpoint: f64, scale: f64) -> Result<Self, ConfigurationError> {
        if scale == 0. {
            return Err(ConfigurationError::ZeroScale);
        }

        Ok(ClosedForm { rate, midpoint, scale })
    }

    fn from_element(element: &Element) -> Result<Self, ConfigurationError> {
        ClosedForm::new(
            element.parse_f64("rate")?,
            element.parse_f64("midpoint")?,
            element.parse_f64("scale")?,
        )
    }

    /// `rate * exp((v - midpoint) / scale)`
    pub fn exponential(&self, v: f64) -> f64 {
        self.rate * ((v - self.midpoint) / self.scale).exp()
    }

    /// `rate / (1 + exp((v - midpoint) / scale))`
    pub fn sigmoid(&self, v: f64) -> f64 {
        self.rate / (1. + ((v - self.midpoint) / self.scale).exp())
    }

    /// `rate * ((v - midpoint) / scale) / (1 - exp((midpoint - v) / scale))`,
    /// equal to `rate` at the removable singularity `v == midpoint`
    pub fn exp_linear(&self, v: f64) -> f64 {
        if v - self.midpoint == 0. {
            return self.rate;
        }

        self.rate * ((v - self.midpoint) / self.scale)
            / (1. - ((self.midpoint - v) / self.scale).exp())
    }
}

/// Values visible to generic expressions other than voltage and concentration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateContext {
    /// Named constants such as `celsius`, `temp_adj_<gate>` and channel parameters
    pub constants: HashMap<String, f64>,
    /// Identifier bound to the concentration for concentration dependent gates
    pub concentration_variable: Option<String>,
}

impl RateContext {
    /// Builds the scope of a gate: `celsius`, `temp_adj_<gate name>` bound to the
    /// gate's Q10 factor, then the channel parameters
    pub fn for_gate(
        temperature: f64,
        gate_name: &str,
        q10: f64,
        parameters: &[(String, f64)],
        concentration_variable: Option<&str>,
    ) -> Self {
        let mut constants = HashMap::new();
        constants.insert(String::from("celsius"), temperature);
        constants.insert(format!("temp_adj_{}", gate_name), q10);
        for (name, value) in parameters {
            constants.insert(name.clone(), *value);
        }

        RateContext {
            constants,
            concentration_variable: concentration_variable.map(String::from),
        }
    }
}

/// A rate function evaluated with a generic expression
#[derive(Debug, Clone)]
pub struct GenericRate {
    expression: Arc<Expression>,
    context: Arc<RateContext>,
    alpha: Option<Box<RateFunction>>,
    beta: Option<Box<RateFunction>>,
}

impl GenericRate {
    /// Compiles expression text for a gate, bare `alpha` and `beta` references become
    /// calls on the given sibling functions with `(v)` or `(v, <concentration variable>)`
    pub fn compile(
        text: &str,
        context: Arc<RateContext>,
        alpha: Option<&RateFunction>,
        beta: Option<&RateFunction>,
    ) -> Result<Self, EvaluationError> {
        let mut args = vec!["v"];
        if let Some(variable) = &context.concentration_variable {
            args.push(variable.as_str());
        }

        let expression = Expression::compile(text)?
            .with_implicit_calls(&["alpha", "beta"], &args);

        Ok(GenericRate {
            expression: Arc::new(expression),
            context,
            alpha: alpha.map(|f| Box::new(f.clone())),
            beta: beta.map(|f| Box::new(f.clone())),
        })
    }

    /// Source text of the expression
    pub fn source(&self) -> &str {
        self.expression.source()
    }

    fn evaluate(&self, v: f64, concentration: Option<f64>) -> Result<f64, EvaluationError> {
        self.expression.evaluate(&RateScope { rate: self, v, concentration })
    }
}

struct RateScope<'a> {
    rate: &'a GenericRate,
    v: f64,
    concentration: Option<f64>,
}

impl Scope for RateScope<'_> {
    fn variable(&self, name: &str) -> Option<f64> {
        if name == "v" {
            return Some(self.v);
        }
        if let (Some(variable), Some(concentration)) = (&self.rate.context.concentration_variable, self.concentration) {
            if name == variable {
                return Some(concentration);
            }
        }

        self.rate.context.constants.get(name).copied()
    }

    fn call(&self, name: &str, args: &[f64]) -> Option<Result<f64, EvaluationError>> {
        let sibling = match name {
            "alpha" => self.rate.alpha.as_deref(),
            "beta" => self.rate.beta.as_deref(),
            _ => None,
        }?;

        let result = match args {
            [v] => sibling.evaluate(*v, None),
            [v, concentration] => sibling.evaluate(*v, Some(*concentration)),
            _ => Err(EvaluationError::WrongArgumentCount {
                name: String::from(name),
                expected: if self.rate.context.concentration_variable.is_some() { 2 } else { 1 },
                found: args.len(),
            }),
        };

        Some(result)
    }
}

/// A function of voltage (and optionally concentration) giving a rate, time constant
/// or steady state value in document units
#[derive(Debug, Clone)]
pub enum RateFunction {
    Exponential(ClosedForm),
    Sigmoid(ClosedForm),
    ExpLinear(ClosedForm),
    Generic(GenericRate),
}

impl RateFunction {
    /// Builds a rate function from an element carrying `expr_form` and either
    /// `rate`, `midpoint` and `scale` or `expr`, generic expressions may reference
    /// the already resolved `alpha` and `beta`
    pub fn from_element(
        element: &Element,
        context: &Arc<RateContext>,
        alpha: Option<&RateFunction>,
        beta: Option<&RateFunction>,
    ) -> Result<Self, ChannelTablesError> {
        let form = ExpressionForm::from_name(element.required_attribute("expr_form")?)?;

        let function = match form {
            ExpressionForm::Exponential => RateFunction::Exponential(ClosedForm::from_element(element)?),
            ExpressionForm::Sigmoid => RateFunction::Sigmoid(ClosedForm::from_element(element)?),
            ExpressionForm::ExpLinear => RateFunction::ExpLinear(ClosedForm::from_element(element)?),
            ExpressionForm::Generic => RateFunction::Generic(
                GenericRate::compile(element.required_attribute("expr")?, Arc::clone(context), alpha, beta)?
            ),
        };

        Ok(function)
    }

    /// Builds a generic rate function from expression text
    pub fn generic(
        text: &str,
        context: &Arc<RateContext>,
        alpha: Option<&RateFunction>,
        beta: Option<&RateFunction>,
    ) -> Result<Self, EvaluationError> {
        Ok(RateFunction::Generic(GenericRate::compile(text, Arc::clone(context), alpha, beta)?))
    }

    /// Kind of the function
    pub fn form(&self) -> ExpressionForm {
        match self {
            RateFunction::Exponential(_) => ExpressionForm::Exponential,
            RateFunction::Sigmoid(_) => ExpressionForm::Sigmoid,
            RateFunction::ExpLinear(_) => ExpressionForm::ExpLinear,
            RateFunction::Generic(_) => ExpressionForm::Generic,
        }
    }

    /// Evaluates at a voltage and, for concentration dependent gates, a concentration,
    /// closed forms only depend on voltage
    pub fn evaluate(&self, v: f64, concentration: Option<f64>) -> Result<f64, EvaluationError> {
        match self {
            RateFunction::Exponential(params) => Ok(params.exponential(v)),
            RateFunction::Sigmoid(params) => Ok(params.sigmoid(v)),
            RateFunction::ExpLinear(params) => Ok(params.exp_linear(v)),
            RateFunction::Generic(rate) => rate.evaluate(v, concentration),
        }
    }
}
