//! Worker runtime primitives shared by the tessel dispatch core.
//!
//! * [`TaskClass`]: classification attached to every spawned unit of work.
//! * [`spawn`] / [`spawn_blocking`]: runtime-agnostic entry points that fall back to a
//!   process-wide runtime when called outside of one.
//! * [`PeriodicTask`]: a cancelable fixed-interval loop with an explicit stop signal.

#![warn(missing_docs)]

mod class;
mod periodic;
mod spawn;

pub use class::TaskClass;
pub use periodic::PeriodicTask;
pub use spawn::{spawn, spawn_blocking};
