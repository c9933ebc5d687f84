use crate::model::friction::FrictionFactorTable;

/// adjacency of the structurally present pairs of a friction table, indexed
/// both by origin and by destination so that each balancing pass only visits
/// pairs that exist.
#[derive(Clone, Debug)]
pub struct PairIndex {
    /// for each origin, (destination, friction factor)
    pub by_origin: Vec<Vec<(usize, f64)>>,
    /// for each destination, (origin, friction factor)
    pub by_destination: Vec<Vec<(usize, f64)>>,
}

impl PairIndex {
    pub fn new(friction: &FrictionFactorTable) -> PairIndex {
        let n = friction.n_zones();
        let mut by_origin: Vec<Vec<(usize, f64)>> = vec![vec![]; n];
        let mut by_destination: Vec<Vec<(usize, f64)>> = vec![vec![]; n];
        for f in friction.factors().iter() {
            by_origin[f.origin].push((f.destination, f.factor));
            by_destination[f.destination].push((f.origin, f.factor));
        }
        PairIndex {
            by_origin,
            by_destination,
        }
    }
}
