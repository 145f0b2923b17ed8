//! Bead-chain physics and interaction for an interactive rosary.
//!
//! `beadchain` simulates a chain of circular and square bodies joined by
//! distance constraints: a loop of beads closed through an anchor, a tail,
//! and a rigid cross at the end. It lays the chain out, steps it, lets the
//! user pick and drag beads, and maps bodies to positions in the prayer
//! sequence. It never draws; hosts read a per-frame snapshot.
//!
//! # Features
//!
//! - **Solver**: semi-implicit Euler with iterative distance relaxation,
//!   boundary containment and a per-iteration correction cap
//! - **Chain builder**: pure, deterministic layout and numbering
//! - **Interaction**: topmost-body picking and a weak pointer constraint
//!   for dragging that does not slingshot the chain
//! - **Stable ids**: ids from a cleared world never resolve again
//! - **Observable**: monitor solver steps via the `StepObserver` trait
//! - **`no_std` compatible**: works in WASM environments
//!
//! # Example
//!
//! ```
//! use beadchain::{EngineConfig, RosaryEngine, Vec2};
//!
//! let mut engine: RosaryEngine = RosaryEngine::new(EngineConfig::default()).unwrap();
//! let cross = engine.topology().terminal_center().unwrap();
//!
//! let click = engine.pointer_down(cross).unwrap().unwrap();
//! assert_eq!(click.logical_index, Some(0));
//!
//! engine.pointer_move(cross + Vec2::new(40.0, 0.0)).unwrap();
//! engine.tick(1.0 / 60.0);
//! engine.pointer_up();
//! ```

#![no_std]

extern crate alloc;

pub mod float;
pub mod vec;
pub mod bounds;
pub mod body;
pub mod constraint;
pub mod config;
pub mod observer;
pub mod world;
pub mod clock;
pub mod chain;
pub mod index;
pub mod interaction;
pub mod color;
pub mod render;
pub mod engine;
pub mod prefs;
pub mod error;

// Re-export primary API
pub use float::Float;
pub use vec::Vec2;
pub use bounds::Rect;
pub use body::{Body, BodyDesc, BodyId, GroupId, Material, Shape};
pub use constraint::{Anchor, ConstraintId, DistanceConstraint, LinkKind};
pub use config::SolverConfig;
pub use observer::{NoOpStepObserver, StepObserver};
pub use world::World;
pub use clock::FrameClock;
pub use chain::{build, AttachMode, ChainHandles, ChainParams, ChainTopology, Role, TerminalNumbering, TerminalShape};
pub use index::IndexMapper;
pub use interaction::{pick, PointerConfig, PointerController};
pub use color::{color_for, Color, ColorScheme};
pub use render::{RenderItem, RenderLink};
pub use engine::{ClickEvent, ConfigChange, EngineConfig, RosaryEngine};
pub use prefs::{MemoryStore, PreferenceStore};
pub use error::{BuildError, WorldError};
