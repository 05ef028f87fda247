//! GPIO adapter, peripheral quiescing, and task placement.

pub mod hw_init;
pub mod quiesce;
pub mod task_pin;
