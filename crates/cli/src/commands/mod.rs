//! CLI commands

pub mod activate;
pub mod auth;
pub mod check;
pub mod init;
pub mod status;
pub mod trial;
pub mod verify;
pub mod watch;
