pub mod stats_ops;
