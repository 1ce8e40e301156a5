//! Simulation primitives
//!
//! The injectable seams the phased loops run on: a virtualizable clock, a
//! pluggable noise strategy for the parametric resource model, and the actor
//! simulator itself.

mod actor;
mod clock;
mod noise;

pub use actor::{ActorSimulator, DEFAULT_QUEUE_CAP};
pub use clock::{Clock, SystemClock, VirtualClock};
pub use noise::{NoNoise, NoiseGenerator, ResourceModel, SeededNoise};
