//! A restricted expression language for generic rate functions.
//!
//! Expressions support numbers, identifiers, calls to a fixed set of math functions,
//! arithmetic, comparisons, logical operators and a single `condition ? a : b` form.
//! Chained comparisons read as a conjunction, `0 < v < 10` is `0 < v && v < 10`,
//! and `and`, `or` and `not` are accepted alongside `&&`, `||` and `!`.
//! Identifiers and calls are resolved through a [`Scope`], nothing outside of the
//! scope and the math whitelist can be reached from an expression.

use std::collections::HashMap;
use pest::Parser;
use pest::iterators::Pairs;
use pest::pratt_parser::PrattParser;
use crate::error::EvaluationError;


#[derive(pest_derive::Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\t" | NEWLINE }

exponent = @{ ^"e" ~ ("+" | "-")? ~ ASCII_DIGIT+ }
number = @{ ((ASCII_DIGIT+ ~ ("." ~ ASCII_DIGIT*)?) | ("." ~ ASCII_DIGIT+)) ~ exponent? }
name = @{ (ASCII_ALPHA | "_") ~ (ASCII_ALPHANUMERIC | "_")* }

args = { (expr ~ ("," ~ expr)*)? }
function = { name ~ "(" ~ args ~ ")" }

group = { "(" ~ expr ~ ")" }
primary = _{ function | number | name | group }

keyword_end = _{ !(ASCII_ALPHANUMERIC | "_") }

unary_minus = { "-" }
unary_plus = { "+" }
not_operator = { "!" }
not_keyword = @{ "not" ~ keyword_end }
prefix = _{ unary_minus | unary_plus | not_operator | not_keyword }

bin_op = _{
    power | add | subtract | multiply | divide |
    greater_than_or_equal | less_than_or_equal | greater_than | less_than |
    equal | not_equal | and_operator | or_operator
}
    power = { "^" | "**" }
    add = { "+" }
    subtract = { "-" }
    multiply = { "*" }
    divide = { "/" }
    greater_than_or_equal = { ">=" }
    less_than_or_equal = { "<=" }
    greater_than = { ">" }
    less_than = { "<" }
    equal = { "==" }
    not_equal = { "!=" }
    and_operator = @{ "&&" | "and" ~ keyword_end }
    or_operator = @{ "||" | "or" ~ keyword_end }

expr = { prefix* ~ primary ~ (bin_op ~ prefix* ~ primary)* }

expression = { SOI ~ expr ~ EOI }
"#]
struct ExpressionParser;

lazy_static::lazy_static! {
    static ref PRATT_PARSER: PrattParser<Rule> = {
        use pest::pratt_parser::{Assoc::*, Op};
        use Rule::*;

        // later operators bind tighter, power binds tighter than unary minus
        // and `not` binds looser than comparisons
        PrattParser::new()
            .op(Op::infix(or_operator, Left))
            .op(Op::infix(and_operator, Left))
            .op(Op::prefix(not_keyword))
            .op(
                Op::infix(equal, Left) | Op::infix(not_equal, Left) | Op::infix(greater_than, Left) |
                Op::infix(greater_than_or_equal, Left) | Op::infix(less_than, Left) |
                Op::infix(less_than_or_equal, Left)
            )
            .op(Op::infix(add, Left) | Op::infix(subtract, Left))
            .op(Op::infix(multiply, Left) | Op::infix(divide, Left))
            .op(Op::prefix(unary_minus) | Op::prefix(unary_plus) | Op::prefix(not_operator))
            .op(Op::infix(power, Right))
    };
}

/// Binary operators of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    And,
    Or,
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64),
    Name(String),
    UnaryMinus(Box<Ast>),
    NotOperator(Box<Ast>),
    BinOp {
        lhs: Box<Ast>,
        op: Op,
        rhs: Box<Ast>,
    },
    Function {
        name: String,
        args: Vec<Ast>,
    },
}

impl Op {
    fn is_comparison(&self) -> bool {
        matches!(
            self,
            Op::Equal | Op::NotEqual | Op::GreaterThan | Op::LessThan |
            Op::GreaterThanOrEqual | Op::LessThanOrEqual
        )
    }
}

// comparisons are collected into a chain until an operand of another operator,
// a group or the whole expression is finished
enum Parsed {
    Node(Ast),
    Chain {
        first: Ast,
        links: Vec<(Op, Ast)>,
    },
}

impl Parsed {
    fn finish(self) -> Ast {
        match self {
            Parsed::Node(ast) => ast,
            Parsed::Chain { first, links } => {
                let mut lhs = first;
                let mut conjunction: Option<Ast> = None;

                for (op, rhs) in links {
                    let comparison = Ast::BinOp {
                        lhs: Box::new(lhs),
                        op,
                        rhs: Box::new(rhs.clone()),
                    };

                    conjunction = Some(match conjunction {
                        Some(previous) => Ast::BinOp {
                            lhs: Box::new(previous),
                            op: Op::And,
                            rhs: Box::new(comparison),
                        },
                        None => comparison,
                    });
                    lhs = rhs;
                }

                conjunction.unwrap_or(lhs)
            },
        }
    }
}

fn parse_ast(pairs: Pairs<Rule>) -> Result<Ast, EvaluationError> {
    parse_chain(pairs).map(Parsed::finish)
}

fn parse_chain(pairs: Pairs<Rule>) -> Result<Parsed, EvaluationError> {
    PRATT_PARSER
        .map_primary(|primary| match primary.as_rule() {
            Rule::number => primary.as_str()
                .parse::<f64>()
                .map(|number| Parsed::Node(Ast::Number(number)))
                .map_err(|_| EvaluationError::Syntax(format!("invalid number {}", primary.as_str()))),
            Rule::name => Ok(Parsed::Node(Ast::Name(String::from(primary.as_str())))),
            Rule::group => {
                let inner = primary.into_inner()
                    .next()
                    .ok_or_else(|| EvaluationError::Syntax(String::from("empty parentheses")))?;

                parse_ast(inner.into_inner()).map(Parsed::Node)
            },
            Rule::function => {
                let mut inner_rules = primary.into_inner();

                let name = inner_rules.next()
                    .map(|pair| String::from(pair.as_str()))
                    .ok_or_else(|| EvaluationError::Syntax(String::from("function without name")))?;

                let args = match inner_rules.next() {
                    Some(args) => args.into_inner()
                        .map(|arg| parse_ast(arg.into_inner()))
                        .collect::<Result<Vec<Ast>, EvaluationError>>()?,
                    None => vec![],
                };

                Ok(Parsed::Node(Ast::Function { name, args }))
            },
            rule => Err(EvaluationError::Syntax(format!("expected atom, found {:?}", rule))),
        })
        .map_prefix(|op, rhs| {
            let rhs = rhs?.finish();
            let ast = match op.as_rule() {
                Rule::unary_minus => Ast::UnaryMinus(Box::new(rhs)),
                Rule::unary_plus => rhs,
                Rule::not_operator | Rule::not_keyword => Ast::NotOperator(Box::new(rhs)),
                rule => return Err(
                    EvaluationError::Syntax(format!("expected prefix operation, found {:?}", rule))
                ),
            };

            Ok(Parsed::Node(ast))
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => Op::Add,
                Rule::subtract => Op::Subtract,
                Rule::multiply => Op::Multiply,
                Rule::divide => Op::Divide,
                Rule::power => Op::Power,
                Rule::equal => Op::Equal,
                Rule::not_equal => Op::NotEqual,
                Rule::greater_than => Op::GreaterThan,
                Rule::greater_than_or_equal => Op::GreaterThanOrEqual,
                Rule::less_than => Op::LessThan,
                Rule::less_than_or_equal => Op::LessThanOrEqual,
                Rule::and_operator => Op::And,
                Rule::or_operator => Op::Or,
                rule => return Err(
                    EvaluationError::Syntax(format!("expected infix operation, found {:?}", rule))
                ),
            };

            let rhs = rhs?.finish();

            if op.is_comparison() {
                return Ok(match lhs? {
                    Parsed::Chain { first, mut links } => {
                        links.push((op, rhs));

                        Parsed::Chain { first, links }
                    },
                    Parsed::Node(lhs) => Parsed::Chain { first: lhs, links: vec![(op, rhs)] },
                });
            }

            Ok(Parsed::Node(Ast::BinOp {
                lhs: Box::new(lhs?.finish()),
                op,
                rhs: Box::new(rhs),
            }))
        })
        .parse(pairs)
}

/// Parses a single expression without conditional handling
pub fn parse(text: &str) -> Result<Ast, EvaluationError> {
    let mut pairs = ExpressionParser::parse(Rule::expression, text)
        .map_err(|e| EvaluationError::Syntax(e.to_string()))?;

    let expr = pairs.next()
        .and_then(|expression| expression.into_inner().next())
        .ok_or_else(|| EvaluationError::Syntax(String::from("empty expression")))?;

    parse_ast(expr.into_inner())
}

/// Provides identifier values and callable functions to an expression
pub trait Scope {
    /// Value bound to `name`, if any
    fn variable(&self, name: &str) -> Option<f64>;

    /// Result of calling `name` with `args` if the scope defines that function,
    /// checked before the math whitelist
    fn call(&self, _name: &str, _args: &[f64]) -> Option<Result<f64, EvaluationError>> {
        None
    }
}

impl Scope for HashMap<String, f64> {
    fn variable(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NumOrBool {
    Number(f64),
    Bool(bool),
}

impl NumOrBool {
    fn as_number(&self) -> f64 {
        match self {
            NumOrBool::Number(x) => *x,
            NumOrBool::Bool(x) => if *x { 1. } else { 0. },
        }
    }

    fn is_true(&self) -> bool {
        match self {
            NumOrBool::Number(x) => *x != 0.,
            NumOrBool::Bool(x) => *x,
        }
    }
}

fn arity(name: &str) -> Option<usize> {
    match name {
        "exp" | "log" | "log10" | "sqrt" | "abs" | "fabs" | "sin" | "cos" | "tan" |
        "asin" | "acos" | "atan" | "sinh" | "cosh" | "tanh" | "ceil" | "floor" |
        "degrees" | "radians" => Some(1),
        "pow" | "atan2" | "fmod" | "hypot" => Some(2),
        _ => None,
    }
}

fn call_builtin(name: &str, args: &[f64]) -> Result<f64, EvaluationError> {
    let expected = arity(name).ok_or_else(|| EvaluationError::UnknownFunction(String::from(name)))?;
    if args.len() != expected {
        return Err(EvaluationError::WrongArgumentCount {
            name: String::from(name),
            expected,
            found: args.len(),
        });
    }

    let domain_error = || Err(EvaluationError::MathDomain(String::from(name)));

    let x = args[0];
    let value = match name {
        "exp" => x.exp(),
        "log" => if x <= 0. { return domain_error() } else { x.ln() },
        "log10" => if x <= 0. { return domain_error() } else { x.log10() },
        "sqrt" => if x < 0. { return domain_error() } else { x.sqrt() },
        "abs" | "fabs" => x.abs(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => if x.abs() > 1. { return domain_error() } else { x.asin() },
        "acos" => if x.abs() > 1. { return domain_error() } else { x.acos() },
        "atan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "ceil" => x.ceil(),
        "floor" => x.floor(),
        "degrees" => x.to_degrees(),
        "radians" => x.to_radians(),
        "pow" => return power(x, args[1]).or_else(|_| domain_error()),
        "atan2" => x.atan2(args[1]),
        "fmod" => if args[1] == 0. { return domain_error() } else { x % args[1] },
        "hypot" => x.hypot(args[1]),
        _ => return Err(EvaluationError::UnknownFunction(String::from(name))),
    };

    Ok(value)
}

fn power(base: f64, exponent: f64) -> Result<f64, EvaluationError> {
    if base == 0. && exponent < 0. {
        return Err(EvaluationError::DivisionByZero);
    }
    if base < 0. && exponent.fract() != 0. {
        return Err(EvaluationError::MathDomain(String::from("pow")));
    }

    Ok(base.powf(exponent))
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

impl Ast {
    fn evaluate(&self, scope: &dyn Scope) -> Result<NumOrBool, EvaluationError> {
        match self {
            Ast::Number(n) => Ok(NumOrBool::Number(*n)),
            Ast::Name(name) => scope.variable(name)
                .or_else(|| constant(name))
                .map(NumOrBool::Number)
                .ok_or_else(|| EvaluationError::UnknownIdentifier(name.clone())),
            Ast::UnaryMinus(expr) => Ok(NumOrBool::Number(-expr.evaluate(scope)?.as_number())),
            Ast::NotOperator(expr) => Ok(NumOrBool::Bool(!expr.evaluate(scope)?.is_true())),
            Ast::BinOp { lhs, op, rhs } => {
                match op {
                    Op::And => {
                        let lhs = lhs.evaluate(scope)?.is_true();
                        return Ok(NumOrBool::Bool(lhs && rhs.evaluate(scope)?.is_true()));
                    },
                    Op::Or => {
                        let lhs = lhs.evaluate(scope)?.is_true();
                        return Ok(NumOrBool::Bool(lhs || rhs.evaluate(scope)?.is_true()));
                    },
                    _ => {},
                }

                let lhs = lhs.evaluate(scope)?.as_number();
                let rhs = rhs.evaluate(scope)?.as_number();

                let value = match op {
                    Op::Add => NumOrBool::Number(lhs + rhs),
                    Op::Subtract => NumOrBool::Number(lhs - rhs),
                    Op::Multiply => NumOrBool::Number(lhs * rhs),
                    Op::Divide => {
                        if rhs == 0. {
                            return Err(EvaluationError::DivisionByZero);
                        }
                        NumOrBool::Number(lhs / rhs)
                    },
                    Op::Power => NumOrBool::Number(power(lhs, rhs)?),
                    Op::Equal => NumOrBool::Bool(lhs == rhs),
                    Op::NotEqual => NumOrBool::Bool(lhs != rhs),
                    Op::GreaterThan => NumOrBool::Bool(lhs > rhs),
                    Op::GreaterThanOrEqual => NumOrBool::Bool(lhs >= rhs),
                    Op::LessThan => NumOrBool::Bool(lhs < rhs),
                    Op::LessThanOrEqual => NumOrBool::Bool(lhs <= rhs),
                    Op::And | Op::Or => unreachable!("logical operators are short circuited above"),
                };

                Ok(value)
            },
            Ast::Function { name, args } => {
                let args = args.iter()
                    .map(|arg| arg.evaluate(scope).map(|value| value.as_number()))
                    .collect::<Result<Vec<f64>, EvaluationError>>()?;

                match scope.call(name, &args) {
                    Some(result) => result.map(NumOrBool::Number),
                    None => call_builtin(name, &args).map(NumOrBool::Number),
                }
            },
        }
    }

    fn with_implicit_calls(self, callees: &[&str], args: &[&str]) -> Ast {
        match self {
            Ast::Name(name) if callees.contains(&name.as_str()) => Ast::Function {
                name,
                args: args.iter().map(|arg| Ast::Name(String::from(*arg))).collect(),
            },
            Ast::UnaryMinus(expr) => Ast::UnaryMinus(Box::new(expr.with_implicit_calls(callees, args))),
            Ast::NotOperator(expr) => Ast::NotOperator(Box::new(expr.with_implicit_calls(callees, args))),
            Ast::BinOp { lhs, op, rhs } => Ast::BinOp {
                lhs: Box::new(lhs.with_implicit_calls(callees, args)),
                op,
                rhs: Box::new(rhs.with_implicit_calls(callees, args)),
            },
            Ast::Function { name, args: call_args } => Ast::Function {
                name,
                args: call_args.into_iter()
                    .map(|arg| arg.with_implicit_calls(callees, args))
                    .collect(),
            },
            other => other,
        }
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Ast::Number(_) => {},
            Ast::Name(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            },
            Ast::UnaryMinus(expr) | Ast::NotOperator(expr) => expr.collect_names(names),
            Ast::BinOp { lhs, rhs, .. } => {
                lhs.collect_names(names);
                rhs.collect_names(names);
            },
            Ast::Function { name, args } => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
                args.iter().for_each(|arg| arg.collect_names(names));
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Form {
    Plain(Ast),
    // branches that fail to compile keep their error until they are taken
    Conditional {
        condition: Ast,
        when_true: Box<Result<Expression, EvaluationError>>,
        when_false: Box<Result<Expression, EvaluationError>>,
    },
}

/// A compiled expression, immutable once built and safe to evaluate from
/// several threads with different scopes
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    form: Form,
}

impl Expression {
    /// Compiles expression text, text containing `?` is split on the first `?`
    /// and the first `:` after it into a condition and two branches
    pub fn compile(text: &str) -> Result<Self, EvaluationError> {
        let form = match text.split_once('?') {
            Some((condition, alternatives)) => {
                let (when_true, when_false) = alternatives.split_once(':')
                    .ok_or_else(|| EvaluationError::MalformedCondition(String::from(text)))?;

                let condition = parse(condition)
                    .map_err(|e| EvaluationError::MalformedCondition(format!("{} ({})", text, e)))?;

                Form::Conditional {
                    condition,
                    when_true: Box::new(Expression::compile(when_true)),
                    when_false: Box::new(Expression::compile(when_false)),
                }
            },
            None => Form::Plain(parse(text)?),
        };

        Ok(Expression { source: String::from(text.trim()), form })
    }

    /// Expression text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression, only the taken branch of a conditional is evaluated
    pub fn evaluate(&self, scope: &dyn Scope) -> Result<f64, EvaluationError> {
        match &self.form {
            Form::Plain(ast) => Ok(ast.evaluate(scope)?.as_number()),
            Form::Conditional { condition, when_true, when_false } => {
                let branch = if condition.evaluate(scope)?.is_true() {
                    when_true
                } else {
                    when_false
                };

                match branch.as_ref() {
                    Ok(expression) => expression.evaluate(scope),
                    Err(e) => Err(e.clone()),
                }
            },
        }
    }

    /// Rewrites bare references to any of `callees` into calls with `args` as
    /// identifier arguments, for example `alpha` into `alpha(v, ca)`
    pub fn with_implicit_calls(self, callees: &[&str], args: &[&str]) -> Self {
        let form = match self.form {
            Form::Plain(ast) => Form::Plain(ast.with_implicit_calls(callees, args)),
            Form::Conditional { condition, when_true, when_false } => Form::Conditional {
                condition: condition.with_implicit_calls(callees, args),
                when_true: Box::new((*when_true).map(|e| e.with_implicit_calls(callees, args))),
                when_false: Box::new((*when_false).map(|e| e.with_implicit_calls(callees, args))),
            },
        };

        Expression { source: self.source, form }
    }

    /// Identifiers and function names referenced by the expression, including
    /// branches that compiled
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names = vec![];
        self.collect_names(&mut names);

        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match &self.form {
            Form::Plain(ast) => ast.collect_names(names),
            Form::Conditional { condition, when_true, when_false } => {
                condition.collect_names(names);
                if let Ok(expression) = when_true.as_ref() {
                    expression.collect_names(names);
                }
                if let Ok(expression) = when_false.as_ref() {
                    expression.collect_names(names);
                }
            },
        }
    }
}
