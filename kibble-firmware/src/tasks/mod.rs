//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! Only the control task touches the two-wire bus.

pub mod button;
pub mod control;
pub mod sampler;
pub mod schedule;

pub use button::button_task;
pub use control::{control_task, Control};
pub use sampler::sampler_task;
pub use schedule::schedule_task;
