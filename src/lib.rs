//! CBN Session Agent
//!
//! Session authentication for CBN cable routers over their undocumented,
//! browser-facing AJAX/XML interface. The firmware only talks to clients
//! that look exactly like its own web UI, so this crate reproduces the
//! captured header shapes byte for byte, walks the multi-step login
//! handshake, and keeps the resulting session id reusable across runs.
//!
//! # Architecture
//!
//! The crate is built around the [`CbnAgent`]:
//! - **Login state machine**: resume from a stored SID or run the full
//!   credential handshake
//! - **Function invocation**: getter/setter calls against the firmware's
//!   `fun` opcode dispatch
//! - **SID persistence**: file-backed by default, pluggable via
//!   [`SidStore`]
//!
//! # Usage
//!
//! ```bash
//! CBN_USR=admin CBN_PW=secret cbn-login
//! ```
//!
//! # Examples
//!
//! ```rust
//! use cbn_agent::{CbnAgent, Settings};
//!
//! # fn example() -> cbn_agent::Result<()> {
//! let settings = Settings::default();
//! let agent = CbnAgent::new(settings)?;
//! assert_eq!(agent.sid(), None);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod persist;
pub mod session;
pub mod utils;

pub use config::Settings;
pub use error::{Error, Result};
pub use persist::{FileSidStore, SidStore};
pub use session::{CbnAgent, CbnAgentGeneric, Function, ParamMap};
