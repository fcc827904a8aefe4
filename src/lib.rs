//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! `callcore`: the per-call state machine, signaling dispatch, and glare
//! arbitration at the heart of a 1:1 real-time call signaling engine.
//!
//! This crate is deliberately *not* a WebRTC library. It owns the call
//! lifecycle and the decisions about what signaling to send and when; it
//! never touches a socket, a microphone, or a camera itself. Everything
//! that actually moves bytes or media is an embedding application's
//! `core::platform::Platform` implementation, injected once at
//! construction (see `core::handle::CallManagerHandle::new`).

pub mod common;
pub mod core;
pub mod error;

#[cfg(feature = "sim")]
pub mod sim;

pub use crate::common::{ApplicationEvent, CallDirection, CallId, DeviceId};
pub use crate::core::connection::ConnectionEvent;
pub use crate::core::signaling::{Answer, IceCandidate, Offer, ReceivedOffer};
pub use crate::core::{CallContext, CallManager, CallManagerHandle, CallState, IceServer, Platform, PlatformItem, TerminateReason};
pub use crate::error::{CallError, Result};
