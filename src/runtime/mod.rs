//! Runtime evaluation over loaded configuration
//!
//! Pure reads of the config sections plus the platform clock and sensor:
//! - Time-of-day windows and active schedule selection
//! - AutoOff trigger evaluation
//!
//! Nothing here persists anything.

pub mod active;
pub mod auto_off;
pub mod window;

pub use active::{SelectionPolicy, find_active_schedule};
pub use auto_off::{AutoOffReason, AutoOffRuntime, FALLBACK_TEMP_C};
pub use window::{TimeWindow, parse_time_of_day};
