//! NES standard controller protocol: a strobe-latched parallel-to-serial
//! shift register read through `$4016`/`$4017`.

mod controller;

pub use controller::{Button, ControllerPort};
