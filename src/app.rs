pub mod cli;
pub mod logging;
pub mod probe;
pub mod signals;
