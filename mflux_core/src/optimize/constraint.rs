//! Provides structs for representing the linear constraints of the reconciliation problem
use std::fmt::{Display, Formatter};

use nalgebra::{DMatrix, DVector};

use crate::network::{FluxId, NUM_FLUXES};

/// A single linear constraint row over the 29 fluxes, stored sparsely
///
/// Whether the row is read as `terms = rhs` or `terms <= rhs` depends on which half of the
/// [`ConstraintSystem`] it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRow {
    /// Linear terms which are added together, see [`ConstraintTerm`] for more
    pub terms: Vec<ConstraintTerm>,
    /// The right hand side of the constraint
    pub rhs: f64,
}

impl ConstraintRow {
    /// Create a new constraint row
    ///
    /// # Parameters
    /// - `terms`: (flux, coefficient) pairs
    /// - `rhs`: The right hand side of the row
    pub fn new(terms: &[(FluxId, f64)], rhs: f64) -> Self {
        ConstraintRow {
            terms: terms
                .iter()
                .map(|(flux, coefficient)| ConstraintTerm {
                    flux: *flux,
                    coefficient: *coefficient,
                })
                .collect(),
            rhs,
        }
    }

    /// A row without any terms and a zero right hand side, satisfied by every flux vector
    pub fn zero() -> Self {
        ConstraintRow {
            terms: Vec::new(),
            rhs: 0.0,
        }
    }

    /// Coefficient of a flux in this row, zero if the flux does not appear
    pub fn coefficient(&self, flux: FluxId) -> f64 {
        self.terms
            .iter()
            .filter(|t| t.flux == flux)
            .map(|t| t.coefficient)
            .sum()
    }

    /// True if no flux has a nonzero coefficient
    pub fn is_zero(&self) -> bool {
        FluxId::all().all(|flux| self.coefficient(flux) == 0.0)
    }

    /// The fluxes with a nonzero coefficient, in ascending order
    pub fn support(&self) -> Vec<FluxId> {
        FluxId::all()
            .filter(|flux| self.coefficient(*flux) != 0.0)
            .collect()
    }

    /// Dense coefficients, ordered by flux
    pub fn to_dense(&self) -> [f64; NUM_FLUXES] {
        let mut dense = [0.0; NUM_FLUXES];
        for term in &self.terms {
            dense[term.flux.offset()] += term.coefficient;
        }
        dense
    }

    /// Evaluate the left hand side of the row at the given flux values
    pub fn evaluate(&self, fluxes: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient * fluxes[t.flux.offset()])
            .sum()
    }

    /// Convert a vector of terms into a String representation
    fn terms_to_string(&self) -> String {
        if self.terms.is_empty() {
            return String::from("0");
        }
        self.terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the `flux` by the `coefficient`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintTerm {
    /// The flux this term refers to
    pub flux: FluxId,
    /// The coefficient for the flux
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.flux)
    }
}

/// Linear constraints of the reconciliation QP
///
/// Represents `A_eq x = b_eq` and `A_ineq x <= b_ineq` over the 29 fluxes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstraintSystem {
    /// Rows of `A_eq x = b_eq`
    pub equalities: Vec<ConstraintRow>,
    /// Rows of `A_ineq x <= b_ineq`
    pub inequalities: Vec<ConstraintRow>,
}

impl ConstraintSystem {
    /// Create a constraint system without any rows
    pub fn new_empty() -> Self {
        ConstraintSystem::default()
    }

    /// Number of equality rows
    pub fn num_equalities(&self) -> usize {
        self.equalities.len()
    }

    /// Number of inequality rows
    pub fn num_inequalities(&self) -> usize {
        self.inequalities.len()
    }

    /// Append inequality rows after the existing ones
    pub fn extend_inequalities<I: IntoIterator<Item = ConstraintRow>>(&mut self, rows: I) {
        self.inequalities.extend(rows);
    }

    /// Dense `A_eq`
    pub fn a_eq(&self) -> DMatrix<f64> {
        dense_rows(&self.equalities)
    }

    /// Dense `b_eq`
    pub fn b_eq(&self) -> DVector<f64> {
        DVector::from_iterator(self.equalities.len(), self.equalities.iter().map(|r| r.rhs))
    }

    /// Dense `A_ineq`
    pub fn a_ineq(&self) -> DMatrix<f64> {
        dense_rows(&self.inequalities)
    }

    /// Dense `b_ineq`
    pub fn b_ineq(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.inequalities.len(),
            self.inequalities.iter().map(|r| r.rhs),
        )
    }

    /// Largest violation of any row at the given flux values, zero when all rows hold
    pub fn max_violation(&self, fluxes: &[f64]) -> f64 {
        let equality = self
            .equalities
            .iter()
            .map(|r| (r.evaluate(fluxes) - r.rhs).abs());
        let inequality = self
            .inequalities
            .iter()
            .map(|r| (r.evaluate(fluxes) - r.rhs).max(0.0));
        equality.chain(inequality).fold(0.0, f64::max)
    }
}

fn dense_rows(rows: &[ConstraintRow]) -> DMatrix<f64> {
    let dense = rows.iter().map(|r| r.to_dense()).collect::<Vec<_>>();
    DMatrix::from_fn(rows.len(), NUM_FLUXES, |r, c| dense[r][c])
}

impl Display for ConstraintSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in &self.equalities {
            writeln!(f, "{} = {}", row.terms_to_string(), row.rhs)?;
        }
        for row in &self.inequalities {
            writeln!(f, "{} <= {}", row.terms_to_string(), row.rhs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_matrices() {
        let mut system = ConstraintSystem::new_empty();
        system
            .equalities
            .push(ConstraintRow::new(&[(FluxId::of(1), 1.0)], 100.0));
        system.extend_inequalities([
            ConstraintRow::new(&[(FluxId::of(2), -1.0), (FluxId::of(29), 2.0)], 5.0),
            ConstraintRow::zero(),
        ]);
        let a_eq = system.a_eq();
        assert_eq!(a_eq.shape(), (1, 29));
        assert_eq!(a_eq[(0, 0)], 1.0);
        assert_eq!(system.b_eq()[0], 100.0);

        let a_ineq = system.a_ineq();
        assert_eq!(a_ineq.shape(), (2, 29));
        assert_eq!(a_ineq[(0, 1)], -1.0);
        assert_eq!(a_ineq[(0, 28)], 2.0);
        assert!(a_ineq.row(1).iter().all(|v| *v == 0.0));
        assert_eq!(system.b_ineq().as_slice(), &[5.0, 0.0]);
    }

    #[test]
    fn violation_and_display() {
        let mut system = ConstraintSystem::new_empty();
        system
            .equalities
            .push(ConstraintRow::new(&[(FluxId::of(1), 1.0)], 100.0));
        system
            .inequalities
            .push(ConstraintRow::new(&[(FluxId::of(2), 1.0)], 10.0));
        let mut fluxes = [0.0; NUM_FLUXES];
        fluxes[0] = 100.0;
        fluxes[1] = 12.0;
        assert!((system.max_violation(&fluxes) - 2.0).abs() < 1e-12);
        fluxes[1] = 3.0;
        assert_eq!(system.max_violation(&fluxes), 0.0);

        assert_eq!(format!("{}", system), "1*v1 = 100\n1*v2 <= 10\n");
        assert!(ConstraintRow::zero().is_zero());
        assert_eq!(
            ConstraintRow::new(&[(FluxId::of(3), 1.0), (FluxId::of(3), -1.0)], 0.).support(),
            Vec::<FluxId>::new()
        );
    }
}
