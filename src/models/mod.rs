pub mod amount;
pub mod label;
pub mod symbol;
pub mod transaction;
