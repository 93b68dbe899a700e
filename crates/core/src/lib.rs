//! # Contload Core
//!
//! Shared building blocks for the container-loading benchmark harness.
//!
//! ## Core Components
//!
//! - **Random source**: [`Lrand48`] - bit-exact legacy `lrand48` recurrence,
//!   so instances are reproducible across platforms
//! - **Model**: [`Item`], [`ItemType`], [`Container`], [`Instance`]
//! - **Solver boundary**: [`Solver`], [`SolveRequest`], [`Placement`],
//!   [`solve_with_timeout`]
//! - **Verification**: [`verify`], [`verify_placement`] - bounds, overlap,
//!   id uniqueness and volume bookkeeping
//!
//! ## Example
//!
//! ```rust
//! use contload_core::{verify, Container, Instance, Item};
//!
//! let instance = Instance::new(
//!     Container::default(),
//!     vec![
//!         Item::placed(1, [10, 10, 10], [0, 0, 0]),
//!         Item::placed(2, [10, 10, 10], [10, 0, 0]),
//!     ],
//! );
//! assert!(verify(&instance, 2000).is_ok());
//! ```

pub mod error;
pub mod geometry;
pub mod model;
pub mod placement;
pub mod rng;
pub mod solver;
pub mod verify;

// Re-exports
pub use error::{Error, Result};
pub use geometry::Aabb;
pub use model::{Container, Instance, Item, ItemType};
pub use placement::{ItemPlacement, Placement};
pub use rng::Lrand48;
pub use solver::{solve_with_timeout, CancelToken, SolveRequest, Solver};
pub use verify::{verify, verify_placement, VerificationFailure, Violations};
