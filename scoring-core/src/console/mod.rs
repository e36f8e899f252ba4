//! Line-oriented operator console shared by the emulator and firmware.

pub mod commands;
pub mod grammar;

pub use commands::{HELP, Reply, execute, run_line};
pub use grammar::{Command, ConsoleError, parse};
