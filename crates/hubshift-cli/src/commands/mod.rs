//! CLI command implementations

pub mod extract;
pub mod fields;
pub mod init;
pub mod validate;
