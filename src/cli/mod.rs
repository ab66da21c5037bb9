//! Command Line Interface (CLI) layer for STICKERKIT.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the dispatch logic (`runner`) for single-file and batch sticker
//! runs. It wires user-provided options to the library functionality
//! exposed via `stickerkit::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
