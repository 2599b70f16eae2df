//! Command implementations for the wildfly-modules CLI

pub mod install;
pub mod validate;
