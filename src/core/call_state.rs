//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Call states and terminal reasons.

use std::fmt;

use crate::common::ApplicationEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallState {
    /// Record created, not yet handed to the application.
    Idle,
    /// `call()`/`receive_offer()` has run; waiting on the application's
    /// `proceed()`.
    Starting,
    /// `proceed()` has run: the connection and the local session
    /// description (offer or answer) are being built.
    Proceeding,
    /// Outbound: offer sent, awaiting answer and ICE/DTLS completion.
    /// Inbound: answer sent, awaiting the application's `accept()` and
    /// ICE/DTLS completion. Either can arrive first; both must happen
    /// before the call can reach `Connected`.
    Ringing,
    /// Inbound only: the application has called `accept()` (the user
    /// answered) while still waiting on ICE/DTLS to finish.
    Accepting,
    /// Media is flowing.
    Connected,
    /// Was `Connected`; ICE has disconnected and the call is within its
    /// reconnect budget.
    Reconnecting,
    /// Call has ended; no further transitions are possible.
    Terminated(TerminateReason),
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminateReason {
    LocalHangup,
    RemoteHangup,
    RemoteBusy,
    RemoteGlare,
    Timeout,
    InternalFailure,
    SignalingFailure,
    ConnectionFailure,
    /// Silent teardown: the call is discarded before the application was
    /// ever told about it (e.g. a stale offer, or losing glare before
    /// `ShouldStartCall` fired). No `ApplicationEvent` is emitted.
    Dropped,
    ReceivedOfferExpired,
}

impl TerminateReason {
    /// The event to deliver to the application for this reason, or `None`
    /// for reasons that are never surfaced (see `Dropped`).
    pub fn application_event(self) -> Option<ApplicationEvent> {
        use ApplicationEvent::*;
        use TerminateReason::*;
        match self {
            LocalHangup => Some(EndedLocalHangup),
            RemoteHangup => Some(EndedRemoteHangup),
            RemoteBusy => Some(EndedRemoteBusy),
            RemoteGlare => Some(EndedRemoteGlare),
            Timeout => Some(EndedTimeout),
            InternalFailure => Some(EndedInternalFailure),
            SignalingFailure => Some(EndedSignalingFailure),
            ConnectionFailure => Some(EndedConnectionFailure),
            Dropped => None,
            ReceivedOfferExpired => Some(EndedReceivedOfferExpired),
        }
    }
}

impl fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
