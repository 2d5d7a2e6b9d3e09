use std::fmt::{Display, Debug, Formatter, Result};


/// Error set for malformed, missing or contradictory document content
#[derive(Clone, PartialEq)]
pub enum ConfigurationError {
    /// Document declares a unit system that is neither physiological nor SI units
    UnsupportedUnitSystem(String),
    /// More than three gates declared (only X, Y and Z slots exist)
    TooManyGates(usize),
    /// A required child element is absent
    MissingElement {
        /// Element that should contain the child
        parent: String,
        /// Name of the missing child
        element: String,
    },
    /// A required attribute is absent
    MissingAttribute {
        /// Element missing the attribute
        element: String,
        /// Name of the missing attribute
        attribute: String,
    },
    /// An attribute could not be parsed as a number
    InvalidNumber {
        /// Attribute name
        attribute: String,
        /// Raw attribute text
        value: String,
    },
    /// `expr_form` is not one of `exponential`, `sigmoid`, `exp_linear` or `generic`
    UnsupportedExpressionForm(String),
    /// Transitions must be named `alpha` or `beta`
    UnsupportedTransition(String),
    /// Gate lacks a time course or steady state and does not define both alpha and beta
    MissingTransitions,
    /// Expression references a transition the gate does not define
    UndefinedTransition(String),
    /// Transitions reference each other so none can be built first
    CyclicTransitions(Vec<String>),
    /// Closed form rate function declared with a scale of zero
    ZeroScale,
    /// Voltage grid bounds or division count cannot be sampled
    InvalidGrid(String),
    /// Ion pools can only model calcium species
    UnsupportedIonSpecies(String),
    /// Document text could not be parsed into an element tree
    MalformedDocument(String),
    /// Settings file could not be read or parsed
    InvalidSettings(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ConfigurationError::UnsupportedUnitSystem(units) => write!(
                f, "Unsupported unit system: {}", units
            ),
            ConfigurationError::TooManyGates(count) => write!(
                f, "Found {} gates but at most three (x, y and z) gates are possible", count
            ),
            ConfigurationError::MissingElement { parent, element } => write!(
                f, "Element <{}> is missing required <{}> element", parent, element
            ),
            ConfigurationError::MissingAttribute { element, attribute } => write!(
                f, "Element <{}> is missing required attribute '{}'", element, attribute
            ),
            ConfigurationError::InvalidNumber { attribute, value } => write!(
                f, "Cannot parse attribute '{}' as a number: '{}'", attribute, value
            ),
            ConfigurationError::UnsupportedExpressionForm(form) => write!(
                f, "Unsupported function type: {}", form
            ),
            ConfigurationError::UnsupportedTransition(name) => write!(
                f, "Unsupported transition: {} (transitions must be alpha or beta)", name
            ),
            ConfigurationError::MissingTransitions => write!(
                f, "Gate without time course or steady state must define both alpha and beta"
            ),
            ConfigurationError::UndefinedTransition(name) => write!(
                f, "Expression references undefined transition: {}", name
            ),
            ConfigurationError::CyclicTransitions(names) => write!(
                f, "Transitions reference each other: {}", names.join(", ")
            ),
            ConfigurationError::ZeroScale => write!(f, "Rate function scale cannot be zero"),
            ConfigurationError::InvalidGrid(reason) => write!(f, "Invalid table grid: {}", reason),
            ConfigurationError::UnsupportedIonSpecies(species) => write!(
                f, "Cannot handle non calcium ion pools: {}", species
            ),
            ConfigurationError::MalformedDocument(reason) => write!(
                f, "Malformed document: {}", reason
            ),
            ConfigurationError::InvalidSettings(reason) => write!(
                f, "Invalid settings: {}", reason
            ),
        }
    }
}

impl Debug for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for failures while compiling or evaluating rate expressions
#[derive(Clone, PartialEq)]
pub enum EvaluationError {
    /// Expression text does not match the expression grammar
    Syntax(String),
    /// Identifier is not bound in the evaluation scope
    UnknownIdentifier(String),
    /// Function is not in the whitelist of safe functions
    UnknownFunction(String),
    /// Function called with the wrong number of arguments
    WrongArgumentCount {
        /// Function name
        name: String,
        /// Number of arguments the function takes
        expected: usize,
        /// Number of arguments supplied
        found: usize,
    },
    /// Division by zero where no limit is defined
    DivisionByZero,
    /// Math function called outside of its domain
    MathDomain(String),
    /// Conditional expression is missing its branches or its condition is invalid
    MalformedCondition(String),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            EvaluationError::Syntax(reason) => write!(f, "Cannot parse expression: {}", reason),
            EvaluationError::UnknownIdentifier(name) => write!(f, "Identifier not allowed: {}", name),
            EvaluationError::UnknownFunction(name) => write!(f, "Function not allowed: {}", name),
            EvaluationError::WrongArgumentCount { name, expected, found } => write!(
                f, "Function {} takes {} arguments but {} were given", name, expected, found
            ),
            EvaluationError::DivisionByZero => write!(f, "Division by zero"),
            EvaluationError::MathDomain(name) => write!(f, "Math domain error in {}", name),
            EvaluationError::MalformedCondition(text) => write!(
                f, "Malformed conditional expression: {}", text
            ),
        }
    }
}

impl Debug for EvaluationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// A set of errors that may occur when compiling channel documents
#[derive(Clone, PartialEq)]
pub enum ChannelTablesError {
    /// Errors related to document content
    ConfigurationRelatedError(ConfigurationError),
    /// Errors related to rate expressions
    EvaluationRelatedError(EvaluationError),
    /// An error annotated with the channel, gate or transition it came from
    Located {
        /// Description of the location, such as `gate 'm'`
        location: String,
        /// Underlying error
        error: Box<ChannelTablesError>,
    },
}

impl ChannelTablesError {
    /// Wraps the error with the name of the model component that produced it
    pub fn within(self, location: impl Into<String>) -> Self {
        ChannelTablesError::Located { location: location.into(), error: Box::new(self) }
    }

    /// Returns the innermost error, stripping location annotations
    pub fn root_cause(&self) -> &ChannelTablesError {
        match self {
            ChannelTablesError::Located { error, .. } => error.root_cause(),
            other => other,
        }
    }

    /// Returns locations from outermost to innermost
    pub fn locations(&self) -> Vec<&str> {
        let mut locations = vec![];
        let mut current = self;
        while let ChannelTablesError::Located { location, error } = current {
            locations.push(location.as_str());
            current = error;
        }

        locations
    }

    /// Whether the underlying error is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self.root_cause(), ChannelTablesError::ConfigurationRelatedError(_))
    }

    /// Whether the underlying error is an evaluation error
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self.root_cause(), ChannelTablesError::EvaluationRelatedError(_))
    }
}

impl Display for ChannelTablesError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ChannelTablesError::ConfigurationRelatedError(err) => write!(f, "{}", err),
            ChannelTablesError::EvaluationRelatedError(err) => write!(f, "{}", err),
            ChannelTablesError::Located { location, error } => write!(f, "{}: {}", location, error),
        }
    }
}

impl Debug for ChannelTablesError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl From<ConfigurationError> for ChannelTablesError {
    fn from(err: ConfigurationError) -> ChannelTablesError {
        ChannelTablesError::ConfigurationRelatedError(err)
    }
}

impl From<EvaluationError> for ChannelTablesError {
    fn from(err: EvaluationError) -> ChannelTablesError {
        ChannelTablesError::EvaluationRelatedError(err)
    }
}

/// Attaches location annotations to results
pub trait Locate<T> {
    /// Wraps any error with the location returned by `location`
    fn within<F: FnOnce() -> String>(self, location: F) -> std::result::Result<T, ChannelTablesError>;
}

impl<T, E: Into<ChannelTablesError>> Locate<T> for std::result::Result<T, E> {
    fn within<F: FnOnce() -> String>(self, location: F) -> std::result::Result<T, ChannelTablesError> {
        self.map_err(|err| err.into().within(location()))
    }
}
