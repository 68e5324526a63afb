pub mod range;
pub mod unit;
