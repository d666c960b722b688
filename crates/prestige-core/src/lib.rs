//! Prestige Core - progression engine for incremental games
//!
//! This crate provides the building blocks of a layered incremental game:
//! - Big-number arithmetic (`Decimal`) that never overflows
//! - Reactive values (`Resource`, `Flag`, `Source`, `Condition`)
//! - Ordered modifier pipelines with inversion
//! - Formulas that can be evaluated and solved for their input
//! - Conversions, costs and purchases (`Upgrade`, `Repeatable`, `Challenge`)
//! - Layers, the reset tree and the tick scheduler
//!
//! ## Threading
//!
//! Values are shared through `Rc` and `Cell`, so every engine type is `!Send`.
//! A game runs on one thread and owns its registry, tree and scheduler.
//!
//! ## Saves
//!
//! `Snapshot` captures persisted state by layer id and field name, as RON:
//!
//! ```
//! use prestige_core::{Clock, Decimal, Layer, LayerRegistry, Resource, Snapshot};
//!
//! let points = Resource::new("points", 0);
//! let mut registry = LayerRegistry::new();
//! registry.register(Layer::new("main", "Main").with_resource(&points)).unwrap();
//!
//! points.set(42);
//! let saved = Snapshot::capture(&registry, &Clock::new()).to_ron().unwrap();
//!
//! points.set(0);
//! Snapshot::from_ron_str(&saved).unwrap().restore(&registry);
//! assert_eq!(points.value(), Decimal::from(42));
//! ```

mod config;
mod conversion;
mod decimal;
mod error;
pub mod formula;
mod identity;
mod layer;
mod modifier;
mod purchase;
mod registry;
mod requirement;
mod resource;
pub mod scheduler;
mod snapshot;
mod source;
mod tree;

pub use config::{EngineConfig, SearchConfig};
pub use conversion::Conversion;
pub use decimal::{Decimal, MAX_EXPONENT};
pub use error::{Error, Result};
pub use formula::search::Bracket;
pub use formula::Formula;
pub use identity::LayerId;
pub use layer::{Layer, Manifest, UpdateHandler};
pub use modifier::{Modifier, ModifierKind, ModifierPipeline, ModifyOp};
pub use purchase::{Challenge, Hook, Purchasable, Repeatable, Upgrade, Visibility};
pub use registry::LayerRegistry;
pub use requirement::{
    max_requirements_met, pay_requirements, requirements_met, BooleanRequirement, Cost,
    CostRequirement, Requirement,
};
pub use resource::{Flag, Resettable, Resource, ResourceRef, Tracker};
pub use scheduler::{Clock, Scheduler, SchedulerState, Tick, TickContext};
pub use snapshot::{ChallengeSnapshot, LayerSnapshot, Snapshot, TrackerSnapshot};
pub use source::{Condition, Source};
pub use tree::{CascadePolicy, ResetReport, ResetTree, TreeNode};
