pub mod board;
pub mod transitions;

pub use board::{parse_departure, validate_flight_number, FlightBoard, DEPARTURE_FORMAT};
pub use transitions::TransitionPolicy;
