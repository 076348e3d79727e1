//! Reading Validation
//!
//! Plausibility checks for noise readings. Checks are disabled by default;
//! devices in the field are known to report empty ids and inconsistent levels.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, Validator};
