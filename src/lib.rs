pub mod driver;
pub mod ir;
pub mod lower;
pub mod types;
