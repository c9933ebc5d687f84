pub mod io_ops;
mod tdm_cli_error;
pub mod tdm_run;

pub use tdm_cli_error::TdmCliError;
