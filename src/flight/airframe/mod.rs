pub mod airframe_data;
pub mod fuel;

pub use airframe_data::{AirframeProfile, InvalidAirframe};
