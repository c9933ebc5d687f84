mod balancer_config;
mod flow_matrix;
mod gravity_balancer;
pub mod gravity_ops;
mod gravity_solution;
mod pair_index;

pub use balancer_config::BalancerConfig;
pub use flow_matrix::{Flow, FlowMatrix, FlowRow};
pub use gravity_balancer::GravityBalancer;
pub use gravity_solution::{
    BalanceStatus, ConvergenceReport, GapSide, GravitySolution, StructuralGap, StructuralGapReport,
};
pub use pair_index::PairIndex;
