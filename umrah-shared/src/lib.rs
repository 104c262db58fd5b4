pub mod money;
pub mod pii;
pub mod models;

pub use money::{from_minor_units, to_minor_units, DEFAULT_CURRENCY};
pub use pii::Masked;
