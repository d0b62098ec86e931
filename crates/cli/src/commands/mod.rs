//! Command implementations.

mod describe;
mod run;
mod validate;

pub use describe::{run_describe, run_sample_config};
pub use run::run_output;
pub use validate::run_validate;
