// Domain layer - Core types and pure functions
pub mod errors;
pub mod geo;
pub mod run;
pub mod sample;
pub mod segment;
