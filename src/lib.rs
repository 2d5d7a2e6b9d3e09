//! # Channel Tables
//!
//! `channel_tables` compiles ChannelML descriptions of ion channels, synapses and
//! ion pools into the lookup tables and scalar parameters used by compartmental
//! neuron simulators. Gate transitions are described with closed form rate functions
//! (`exponential`, `sigmoid`, `exp_linear`) or with generic expressions that are
//! parsed and evaluated by a restricted evaluator, then sampled over a voltage grid
//! (and a concentration grid for calcium dependent channels) into `A` and `B` tables
//! in SI units.
//!
//! ## Example Code
//!
//! ### Compiling a Hodgkin Huxley sodium activation gate
//!
//! ```rust
//! use channel_tables::error::ChannelTablesError;
//! use channel_tables::library::compile_str;
//! use channel_tables::settings::CompilerSettings;
//! use channel_tables::tables::GateTable;
//!
//!
//! fn main() -> Result<(), ChannelTablesError> {
//!     let document = r#"
//!         <channelml units="Physiological Units">
//!             <channel_type name="NaChannel">
//!                 <current_voltage_relation cond_law="ohmic" ion="na" default_gmax="120" default_erev="50">
//!                     <gate name="m" instances="3">
//!                         <transition name="alpha" expr_form="exp_linear" rate="1" midpoint="-40" scale="10"/>
//!                         <transition name="beta" expr_form="exponential" rate="4" midpoint="-65" scale="-18"/>
//!                     </gate>
//!                 </current_voltage_relation>
//!             </channel_type>
//!         </channelml>
//!     "#;
//!
//!     let library = compile_str(document, &CompilerSettings::default())?;
//!
//!     let channel = library.channel("NaChannel").expect("channel should be compiled");
//!     if let GateTable::OneDimensional(table) = &channel.gates[0].table {
//!         // forward rate and total rate (1/s) at -65 mV
//!         let (a, b) = table.interpolate(-0.065);
//!         println!("A: {}, B: {}", a, b);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Evaluating an expression
//!
//! ```rust
//! use std::collections::HashMap;
//! use channel_tables::expression::Expression;
//! use channel_tables::error::EvaluationError;
//!
//!
//! fn main() -> Result<(), EvaluationError> {
//!     let expression = Expression::compile("v < -50 ? 0 : exp(v / 10)")?;
//!
//!     let mut scope = HashMap::new();
//!     scope.insert(String::from("v"), -60.);
//!
//!     assert_eq!(expression.evaluate(&scope)?, 0.);
//!
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod error;
pub mod expression;
pub mod library;
pub mod q10;
pub mod rate;
pub mod settings;
pub mod tables;
pub mod units;
