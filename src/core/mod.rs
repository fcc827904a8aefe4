//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! The call-manager core: per-call state machine, signaling dispatch, and
//! the single-writer event thread that owns all of it.

pub mod arbiter;
pub mod call;
pub mod call_context;
pub mod call_fsm;
pub mod call_manager;
pub mod call_state;
pub mod connection;
pub mod handle;
pub mod platform;
pub mod signaling;

pub use call_context::CallContext;
pub use call_manager::CallManager;
pub use call_state::{CallState, TerminateReason};
pub use handle::CallManagerHandle;
pub use platform::{IceServer, Platform, PlatformItem};
