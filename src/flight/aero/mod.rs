pub mod atmosphere;
pub mod wind;
