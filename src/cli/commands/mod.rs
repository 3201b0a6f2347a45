//! One module per CLI subcommand.

pub mod audit_cmd;
pub mod deactivate;
pub mod keygen;
pub mod list;
pub mod register;
pub mod reveal;
pub mod set_default;
pub mod update;
