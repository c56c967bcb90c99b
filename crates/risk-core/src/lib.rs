pub mod classify;
pub mod error;
pub mod types;

pub use classify::*;
pub use error::*;
pub use types::*;
