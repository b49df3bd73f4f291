pub mod batchrunner;
pub mod flight;
pub mod parameters;
