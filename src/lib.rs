//
// lib.rs
// semdiff
//
// Library entry that re-exports modules so the binary and any external users can access CLI parsing, the diff engine, and report rendering.
//
// Public crate interface: re-export modules used by the binary and tests.
pub mod block;
pub mod cli;
pub mod engine;
pub mod input;
pub mod report;
pub mod script;
pub mod similarity;
pub mod text;

pub use cli::{build_options, Args, Options};
pub use engine::{perform_diff, perform_diff_traced, DiffConfig, DiffEntry, DiffKind};
pub use report::{render_focus, render_report, DetailSelection, FocusRange};
