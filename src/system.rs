//! Remote BMC command plumbing: command definitions and the ipmitool executor.

pub mod commands;
pub mod executor;
