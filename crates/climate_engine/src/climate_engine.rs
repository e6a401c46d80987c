//! Climate Engine - Pure climate computations
//!
//! This crate contains the room HVAC sizing model, the comfort scorer, the
//! chart bucketing logic and the TTL cache used by the service layer.
//! Nothing here performs I/O.

pub use climate_types;

mod aggregate;
mod bucketer;
mod cache;
mod room_model;
mod scorer;
mod time;

pub use aggregate::*;
pub use bucketer::*;
pub use cache::*;
pub use room_model::*;
pub use scorer::*;
pub use time::*;
