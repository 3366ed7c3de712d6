//! Session handling for the device's AJAX/XML interface
//!
//! This module carries the login state machine, the two fixed header
//! profiles, the function opcode table, and request construction against
//! one device. [`CbnAgent`] is the entry point; everything else backs it.

pub mod agent;
pub mod functions;
pub mod headers;
pub mod request;
pub mod state;

pub use agent::{CbnAgent, CbnAgentGeneric};
pub use functions::{Endpoint, Function};
pub use headers::{HeaderProfile, USER_AGENT};
pub use request::{ParamMap, RequestBuilder, encode_params};
pub use state::SessionState;
