//! Per flux comparison of a reconciled flux vector against its prediction
use std::fmt::{Display, Formatter};

use crate::network::{FluxId, FluxVector};

/// Comparison of a single flux
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiffRow {
    pub flux: FluxId,
    pub adjusted: f64,
    pub predicted: f64,
    /// `adjusted - predicted`
    pub diff: f64,
    /// Difference in percent of the predicted value, not finite when the prediction is 0
    pub diff_percent: f64,
    /// Difference in percent of the width of the physiological range of the flux
    pub diff_percent_of_range: f64,
}

/// Comparison of every flux, in flux order
#[derive(Clone, Debug, PartialEq)]
pub struct DiffReport {
    rows: Vec<DiffRow>,
}

impl DiffReport {
    pub fn new(adjusted: &FluxVector, predicted: &FluxVector) -> Self {
        let rows = FluxId::all()
            .map(|flux| {
                let adjusted = adjusted.get(flux);
                let predicted = predicted.get(flux);
                let diff = adjusted - predicted;
                let (lower, upper) = flux.physiological_range();
                DiffRow {
                    flux,
                    adjusted,
                    predicted,
                    diff,
                    diff_percent: 100.0 * diff / predicted,
                    diff_percent_of_range: 100.0 * diff / (upper - lower),
                }
            })
            .collect();
        DiffReport { rows }
    }

    pub fn rows(&self) -> &[DiffRow] {
        &self.rows
    }

    /// Largest absolute difference over all fluxes
    pub fn max_abs_diff(&self) -> f64 {
        self.rows.iter().fold(0.0, |max, row| f64::max(max, row.diff.abs()))
    }
}

impl Display for DiffReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, " V   Adjusted  Predicted    Diff    Diff%   Diff%Rg")?;
        for row in self.rows.iter() {
            writeln!(
                f,
                "{:2}{:10.3}{:10.3}{:10.3}{:8.1}{:8.1}",
                row.flux.get(),
                row.adjusted,
                row.predicted,
                row.diff,
                row.diff_percent,
                row.diff_percent_of_range
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_columns() {
        let predicted = FluxVector::from_slice(&[50.0; 29]).unwrap();
        let mut adjusted = predicted.clone();
        adjusted.set(FluxId::of(1), 100.0);
        let report = DiffReport::new(&adjusted, &predicted);
        assert_eq!(report.rows().len(), 29);

        let first = report.rows()[0];
        assert_eq!(first.diff, 50.0);
        assert!((first.diff_percent - 100.0).abs() < 1e-12);
        // v1 ranges over [0, 100]
        assert!((first.diff_percent_of_range - 50.0).abs() < 1e-12);
        assert_eq!(report.rows()[5].diff, 0.0);
        assert_eq!(report.max_abs_diff(), 50.0);
    }

    #[test]
    fn zero_prediction() {
        let predicted = FluxVector::zeros();
        let adjusted = FluxVector::from_slice(&[1.0; 29]).unwrap();
        let report = DiffReport::new(&adjusted, &predicted);
        assert!(report.rows()[0].diff_percent.is_infinite());
    }

    #[test]
    fn rendering() {
        let fluxes = FluxVector::from_slice(&[2.0; 29]).unwrap();
        let rendered = format!("{}", DiffReport::new(&fluxes, &fluxes));
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 30);
        assert!(lines[0].starts_with(" V   Adjusted"));
        assert_eq!(lines[1], " 1     2.000     2.000     0.000     0.0     0.0");
    }
}
