//! balancing passes of the doubly-constrained gravity model.
//!
//! the model uses one canonical form throughout:
//!
//! ```text
//! A_i  = 1 / Σ_j B_j D_j F_ij
//! B_j  = 1 / Σ_i A_i O_i F_ij
//! T_ij = A_i O_i B_j D_j F_ij
//! ```
//!
//! so that `Σ_j T_ij = O_i` holds exactly after a destination pass and
//! `Σ_i T_ij = D_j` holds exactly after an origin pass. with uniform friction
//! the first iteration reproduces the independence solution
//! `T_ij = O_i D_j / Σ O`.
//!
//! every function here is pure: it reads immutable marginals and factors and
//! returns new vectors.
use super::PairIndex;
use crate::model::friction::FrictionFactor;
use crate::util::stats_ops::relative_deviation;
use std::collections::BTreeSet;

/// balancing factors of one pass, along with the zones whose denominator was
/// zero despite a positive target.
#[derive(Clone, Debug, PartialEq)]
pub struct PassResult {
    pub factors: Vec<f64>,
    pub unconstrainable: Vec<usize>,
}

/// computes `A_i` for every origin from the current destination factors.
pub fn destination_pass(
    index: &PairIndex,
    b: &[f64],
    productions: &[f64],
    attractions: &[f64],
) -> PassResult {
    balancing_pass(&index.by_origin, b, productions, attractions)
}

/// computes `B_j` for every destination from the current origin factors.
pub fn origin_pass(
    index: &PairIndex,
    a: &[f64],
    productions: &[f64],
    attractions: &[f64],
) -> PassResult {
    balancing_pass(&index.by_destination, a, attractions, productions)
}

/// shared form of both passes. for zone k with target `own[k]`, the factor is
/// `1 / Σ other_factor[m] * other[m] * F` over the pairs adjacent to k. a zone
/// with a zero target gets a zero factor without evaluating the sum; a zone
/// with a positive target and a zero sum is unconstrainable and also gets a
/// zero factor.
fn balancing_pass(
    adjacency: &[Vec<(usize, f64)>],
    other_factors: &[f64],
    own_targets: &[f64],
    other_targets: &[f64],
) -> PassResult {
    let mut unconstrainable = vec![];
    let factors = adjacency
        .iter()
        .enumerate()
        .map(|(k, pairs)| {
            if own_targets[k] == 0.0 {
                return 0.0;
            }
            let denominator: f64 = pairs
                .iter()
                .map(|(m, f)| other_factors[*m] * other_targets[*m] * f)
                .sum();
            if denominator > 0.0 && denominator.is_finite() {
                1.0 / denominator
            } else {
                unconstrainable.push(k);
                0.0
            }
        })
        .collect();
    PassResult {
        factors,
        unconstrainable,
    }
}

/// flows `T_ij = A_i O_i B_j D_j F_ij` in the order of the friction factors.
pub fn compute_flows(
    friction: &[FrictionFactor],
    a: &[f64],
    b: &[f64],
    productions: &[f64],
    attractions: &[f64],
) -> Vec<f64> {
    friction
        .iter()
        .map(|f| {
            let i = f.origin;
            let j = f.destination;
            a[i] * productions[i] * b[j] * attractions[j] * f.factor
        })
        .collect()
}

/// row sums (by origin) and column sums (by destination) of a flow vector
/// aligned with `friction`.
pub fn marginal_sums(
    friction: &[FrictionFactor],
    flows: &[f64],
    n_zones: usize,
) -> (Vec<f64>, Vec<f64>) {
    let mut rows = vec![0.0; n_zones];
    let mut cols = vec![0.0; n_zones];
    for (f, t) in friction.iter().zip(flows.iter()) {
        rows[f.origin] += t;
        cols[f.destination] += t;
    }
    (rows, cols)
}

/// the maximum relative deviation of any row sum from its production or any
/// column sum from its attraction. zones with a zero target and zones that
/// were found unconstrainable are not measured.
pub fn convergence_error(
    row_sums: &[f64],
    col_sums: &[f64],
    productions: &[f64],
    attractions: &[f64],
    unconstrainable_origins: &BTreeSet<usize>,
    unconstrainable_destinations: &BTreeSet<usize>,
) -> f64 {
    let row_error = measured(productions, unconstrainable_origins)
        .map(|i| relative_deviation(row_sums[i], productions[i]))
        .fold(0.0, f64::max);
    let col_error = measured(attractions, unconstrainable_destinations)
        .map(|j| relative_deviation(col_sums[j], attractions[j]))
        .fold(0.0, f64::max);
    row_error.max(col_error)
}

fn measured<'a>(
    targets: &'a [f64],
    excluded: &'a BTreeSet<usize>,
) -> impl Iterator<Item = usize> + 'a {
    targets
        .iter()
        .enumerate()
        .filter(move |(k, t)| **t > 0.0 && !excluded.contains(k))
        .map(|(k, _)| k)
}
