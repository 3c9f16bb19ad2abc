//! Fan control core: pure decision engine, command-issuing controller, loop lifecycle.

pub mod decision;
pub mod fan_control;
pub mod lifecycle;

pub use lifecycle::ControlLoop;
