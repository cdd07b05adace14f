//! Fixed-size boid flock advanced once per animation frame.
//!
//! A [`Flock`] owns its agents, bounds, rules and hover state. The host calls
//! [`Flock::tick`] from its frame loop, forwards resize and hover events
//! between ticks, and reads positions plus orientation back out through
//! [`pose`] for drawing.

pub mod bounds;
pub mod config;
pub mod error;
pub mod flock;
pub mod pose;
pub mod sampling;
pub mod vector;

pub use bounds::Bounds;
pub use config::{agent_count, velocity_range, BoundaryPolicy, Cohesion, FlockConfig, SpeedLimit};
pub use error::FlockError;
pub use flock::{advance, apply_boundary, cohesion_nudge, Agent, Flock};
pub use sampling::{AgentSampler, UniformSampler};
pub use vector::{Vector, Vector2D, Vector3D};

/// The 2D canvas flock
pub type CanvasFlock = Flock<Vector2D>;

/// The 3D instanced flock
pub type ButtonFlock = Flock<Vector3D>;
