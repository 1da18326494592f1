pub mod guard;
pub mod hook;
pub mod reservations;
