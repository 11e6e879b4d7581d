//! Platform implementations.

pub mod console;

pub use console::{ConsoleConfig, ConsolePlatform};
