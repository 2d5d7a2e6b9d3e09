//! Discretization of gate kinetics into the `A` and `B` lookup tables consumed by
//! the simulator, along with the grid metadata needed to interpolate them.
//!
//! `A` holds the forward rate and `B` the sum of forward and backward rates,
//! both per second.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use crate::error::{ConfigurationError, EvaluationError};
use crate::units::UnitScale;


/// Largest number of divisions accepted for a single axis
pub const MAX_DIVISIONS: usize = 100_000;

/// Evenly spaced sampling axis with `divisions + 1` points from `min` to `max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableAxis {
    pub min: f64,
    pub max: f64,
    pub divisions: usize,
}

impl TableAxis {
    /// Creates an axis, requires between one and [`MAX_DIVISIONS`] divisions and `max > min`
    pub fn new(min: f64, max: f64, divisions: usize) -> Result<Self, ConfigurationError> {
        if divisions == 0 {
            return Err(ConfigurationError::InvalidGrid(String::from("table must have at least one division")));
        }
        if divisions > MAX_DIVISIONS {
            return Err(ConfigurationError::InvalidGrid(
                format!("{} divisions exceeds the limit of {}", divisions, MAX_DIVISIONS)
            ));
        }
        if !(max > min) {
            return Err(ConfigurationError::InvalidGrid(format!("maximum {} must exceed minimum {}", max, min)));
        }

        Ok(TableAxis { min, max, divisions })
    }

    /// Number of grid points
    pub fn len(&self) -> usize {
        self.divisions + 1
    }

    /// Distance between adjacent grid points
    pub fn step(&self) -> f64 {
        (self.max - self.min) / self.divisions as f64
    }

    /// Coordinate of the `i`th grid point
    pub fn point(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step()
    }

    /// Axis with both bounds multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> TableAxis {
        TableAxis {
            min: self.min * factor,
            max: self.max * factor,
            divisions: self.divisions,
        }
    }

    // index of the lower grid point and the fraction towards the next one,
    // clamped to the edges of the grid
    fn locate(&self, x: f64) -> (usize, f64) {
        if x <= self.min {
            return (0, 0.);
        }
        if x >= self.max {
            return (self.divisions, 0.);
        }

        let position = (x - self.min) / self.step();
        let index = (position.floor() as usize).min(self.divisions - 1);

        (index, position - index as f64)
    }
}

fn lerp(lower: f64, upper: f64, fraction: f64) -> f64 {
    lower + (upper - lower) * fraction
}

/// Tables of a voltage dependent gate
#[derive(Debug, Clone, PartialEq)]
pub struct Table1D {
    /// Forward rate per voltage point (1/s)
    pub table_a: Array1<f64>,
    /// Sum of forward and backward rates per voltage point (1/s)
    pub table_b: Array1<f64>,
    /// Voltage axis (V)
    pub voltage: TableAxis,
}

impl Table1D {
    /// Linearly interpolated `(A, B)` at a voltage (V)
    pub fn interpolate(&self, v: f64) -> (f64, f64) {
        let (i, fraction) = self.voltage.locate(v);
        let next = (i + 1).min(self.voltage.divisions);

        (
            lerp(self.table_a[i], self.table_a[next], fraction),
            lerp(self.table_b[i], self.table_b[next], fraction),
        )
    }
}

/// Tables of a voltage and concentration dependent gate, rows are voltages
/// and columns are concentrations
#[derive(Debug, Clone, PartialEq)]
pub struct Table2D {
    /// Forward rate per (voltage, concentration) point (1/s)
    pub table_a: Array2<f64>,
    /// Sum of forward and backward rates per (voltage, concentration) point (1/s)
    pub table_b: Array2<f64>,
    /// Voltage axis (V)
    pub voltage: TableAxis,
    /// Concentration axis (mol/m^3)
    pub concentration: TableAxis,
}

impl Table2D {
    /// Bilinearly interpolated `(A, B)` at a voltage (V) and concentration (mol/m^3)
    pub fn interpolate(&self, v: f64, concentration: f64) -> (f64, f64) {
        let (i, fx) = self.voltage.locate(v);
        let (j, fy) = self.concentration.locate(concentration);
        let i_next = (i + 1).min(self.voltage.divisions);
        let j_next = (j + 1).min(self.concentration.divisions);

        let bilinear = |table: &Array2<f64>| {
            lerp(
                lerp(table[[i, j]], table[[i, j_next]], fy),
                lerp(table[[i_next, j]], table[[i_next, j_next]], fy),
                fx,
            )
        };

        (bilinear(&self.table_a), bilinear(&self.table_b))
    }
}

/// Generated tables of a gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateTable {
    OneDimensional(Table1D),
    TwoDimensional(Table2D),
}

impl GateTable {
    /// Voltage axis (V)
    pub fn voltage_axis(&self) -> &TableAxis {
        match self {
            GateTable::OneDimensional(table) => &table.voltage,
            GateTable::TwoDimensional(table) => &table.voltage,
        }
    }
}

/// Samples steady state and time constant over `voltage` (document units), each
/// point is shifted down by `offset`, `rates` returns `(inf, tau)` in document units,
/// tables store `inf / tau` and `1 / tau` converted to per second
pub fn tabulate_voltage<F>(
    voltage: &TableAxis,
    offset: f64,
    units: &UnitScale,
    rates: F,
) -> Result<Table1D, EvaluationError>
where
    F: Fn(f64) -> Result<(f64, f64), EvaluationError> + Sync,
{
    let entries = (0..voltage.len())
        .into_par_iter()
        .map(|i| {
            let v = voltage.point(i) - offset;
            let (inf, tau) = rates(v)?;
            if tau == 0. {
                return Err(EvaluationError::DivisionByZero);
            }

            Ok((units.normalize_rate(inf / tau), units.normalize_rate(1. / tau)))
        })
        .collect::<Result<Vec<(f64, f64)>, EvaluationError>>()?;

    Ok(Table1D {
        table_a: entries.iter().map(|(a, _)| *a).collect(),
        table_b: entries.iter().map(|(_, b)| *b).collect(),
        voltage: voltage.scaled(units.voltage),
    })
}

/// Samples forward and backward rates over the grid of `voltage` and `concentration`
/// (document units), voltages are shifted down by `offset`, `rates` returns
/// `(alpha, beta)` per document time unit, every row is computed and stored independently
pub fn tabulate_voltage_concentration<F>(
    voltage: &TableAxis,
    concentration: &TableAxis,
    offset: f64,
    units: &UnitScale,
    rates: F,
) -> Result<Table2D, EvaluationError>
where
    F: Fn(f64, f64) -> Result<(f64, f64), EvaluationError> + Sync,
{
    let rows = (0..voltage.len())
        .into_par_iter()
        .map(|i| {
            let v = voltage.point(i) - offset;

            let mut row_a = Vec::with_capacity(concentration.len());
            let mut row_b = Vec::with_capacity(concentration.len());
            for j in 0..concentration.len() {
                let (alpha, beta) = rates(v, concentration.point(j))?;
                let a = units.normalize_rate(alpha);

                row_a.push(a);
                row_b.push(a + units.normalize_rate(beta));
            }

            Ok((row_a, row_b))
        })
        .collect::<Result<Vec<(Vec<f64>, Vec<f64>)>, EvaluationError>>()?;

    let shape = (voltage.len(), concentration.len());

    Ok(Table2D {
        table_a: Array2::from_shape_fn(shape, |(i, j)| rows[i].0[j]),
        table_b: Array2::from_shape_fn(shape, |(i, j)| rows[i].1[j]),
        voltage: voltage.scaled(units.voltage),
        concentration: concentration.scaled(units.concentration),
    })
}
