mod error;
pub mod ids;

pub use error::{NodeError, Result};
