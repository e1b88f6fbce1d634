mod build;
mod error;
mod sanitize;
mod validate;

pub use build::{build_hist_name, build_physical_name, build_surrogate_key_name};
pub use error::NameError;
pub use sanitize::sanitize;
pub use validate::{validate, validate_with_context};
