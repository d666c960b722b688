//! Prestige Cycles - a layered incremental game built on prestige-core
//!
//! Five layers, registered in tick order:
//! - `main` - points, the root resource
//! - `c` Cycles - Cycle of Points and the repeatable shards
//! - `hc` Hypercycles - converted from cycles, breaks Cycles at upgrade 14
//! - `bc` Broken Cycles - the disable grid
//! - `o` Ouroboros - a single trial that restarts the run
//!
//! The game is won with the first Cycle of Difficulties completion.

pub mod content;
mod error;
mod game;
mod run;

pub use content::Layers;
pub use error::{Error, Result};
pub use game::{CyclesGame, RESET_POLICY};
pub use run::RunConfig;
