//! Loader, validator, and renderer for webpbn puzzle-set files.
//!
//! ```no_run
//! let bytes = std::fs::read("puzzle.xml").unwrap();
//! let mut diags = pbnset::Diagnostics::new();
//! match pbnset::parse(&bytes, &mut diags) {
//!     Ok(set) => print!("{}", pbnset::render_to_string(&set)),
//!     Err(err) => {
//!         for diag in &diags {
//!             eprintln!("{diag}");
//!         }
//!         eprintln!("{err}");
//!     }
//! }
//! ```

pub mod diagnostics;
pub mod loader;
mod normalize;
pub mod puzzle;
pub mod render;
pub mod store;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, ParseError};
pub use loader::{parse, parse_stream};
pub use puzzle::{
    Cell, Clue, Color, Image, MAX_COLORS, Puzzle, PuzzleSet, Solution, SolutionKind,
};
pub use render::{render, render_to_string};
pub use store::{DataIndex, StringIndex};
