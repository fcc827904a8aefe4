//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! The event vocabulary that drives call state transitions.
//!
//! `CallManager` (the only place with enough context to act on these: the
//! registry, the platform, the signaling dispatcher) matches on `CallEvent`
//! directly in its `handle_*` methods. Kept as a distinct module because it
//! is the piece most embedding applications read first to understand what
//! can happen to a call.

use std::fmt;

use crate::common::DeviceId;
use crate::core::connection::ConnectionEvent;
use crate::core::signaling::IceCandidate;

#[derive(Debug)]
pub(crate) enum CallEvent {
    ReceivedAnswer {
        src_device: DeviceId,
        sdp: String,
    },
    ReceivedIce {
        src_device: DeviceId,
        candidates: Vec<IceCandidate>,
    },
    ReceivedHangup,
    ReceivedBusy,
    Connection(ConnectionEvent),
    MessageSent,
    MessageSendFailure,
}

impl fmt::Display for CallEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CallEvent::ReceivedAnswer { .. } => write!(f, "ReceivedAnswer"),
            CallEvent::ReceivedIce { .. } => write!(f, "ReceivedIce"),
            CallEvent::ReceivedHangup => write!(f, "ReceivedHangup"),
            CallEvent::ReceivedBusy => write!(f, "ReceivedBusy"),
            CallEvent::Connection(e) => write!(f, "Connection({:?})", e),
            CallEvent::MessageSent => write!(f, "MessageSent"),
            CallEvent::MessageSendFailure => write!(f, "MessageSendFailure"),
        }
    }
}

/// Log an unhandled (state, event) pair at `warn` level. Call state
/// machines see plenty of benign races (e.g. a hangup arriving just after
/// the call already terminated locally); this makes them visible without
/// treating them as errors.
pub(crate) fn log_unexpected_event(
    call_id: crate::common::CallId,
    state: &crate::core::call_state::CallState,
    event: &CallEvent,
) {
    log::warn!(
        "call {}: ignoring {} while in state {}",
        call_id,
        event,
        state
    );
}
