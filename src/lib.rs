//! Sales aggregation over a directory of flat files.
//!
//! A run reads the branch (and optionally commodity) definition lists, picks up
//! the sequentially numbered `NNNNNNNN.rcd` sales files, adds each amount to the
//! matching totals and writes the `branch.out`/`commodity.out` summaries. The
//! modules follow that flow: [`read`] loads definitions and sales files,
//! [`compute`] accumulates, [`write`] emits summaries and [`pipeline`] sequences it.

pub mod compute;
pub mod data;
pub mod pipeline;
pub mod read;
pub mod write;

pub use data::{Category, Definitions, Error, Layout};
pub use pipeline::{run, Config};
