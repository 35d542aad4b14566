// # dyndns53-admin
//
// Operator CLI for the dyndns53 credential database. The database is a
// plain CSV file of `hostname,secret` lines kept in the configured storage
// backend; this crate uploads and downloads it verbatim.

pub mod admin;
pub mod commands;

pub use admin::{Admin, Outcome, StorageFactory};
pub use commands::{COMMANDS, CommandSpec};
