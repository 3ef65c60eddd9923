mod topology_monitor_actor;
mod topology_monitor_error;
mod topology_monitor_handle;

pub(crate) use topology_monitor_actor::*;
pub use topology_monitor_error::*;
pub use topology_monitor_handle::*;
