//! CLI subcommand implementations for the reciprocity binary.

pub mod doctor;
pub mod output;
pub mod run_cmd;
pub mod scan_cmd;
