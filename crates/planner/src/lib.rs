mod classic;
mod compiler;
mod error;
mod filter;
mod fk;

pub use classic::build_classic_select;
pub use compiler::compile;
pub use error::PlannerError;
pub use filter::{build_source_dataset_where, qualify_source_filter};
pub use fk::build_surrogate_fk_expression;
