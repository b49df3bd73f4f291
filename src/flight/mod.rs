pub mod aero;
pub mod airframe;
pub mod flight_output;
pub mod planner;
pub mod route;
pub mod weather;
