//! Purpose: Define the stable public Rust API boundary for celerite.
//! Exports: Core types and operations needed by the CLI and library callers.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path callers should rely on.

pub use crate::core::env::{
    DEBUG_ENV_VAR, debug_from_env, debug_mode, is_mobile_user_agent, is_private_host,
};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::query::{query_param, query_params};
pub use crate::core::race::{PROBE_PATH, PROBE_TIMEOUT, ProbeReport, Racer};
pub use crate::core::store::{KvStore, StoreHandle};
pub use crate::core::store_paths::default_data_dir;
pub use crate::core::timer::DebugTimer;
pub use crate::core::token::{DEFAULT_TOKEN_LENGTH, random_token};
