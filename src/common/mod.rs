//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Common types used throughout the library.

pub mod config;
pub mod time;

use std::fmt;

use rand::RngCore;

/// Unique call identification number.
///
/// Generated by the core for outgoing calls and carried verbatim in incoming
/// signaling. Glare resolution compares two `CallId`s as unsigned 64-bit
/// integers, so ordering is part of the public contract, not an accident of
/// `#[derive(PartialOrd)]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallId(u64);

impl CallId {
    /// Generate a fresh, random `CallId`.
    ///
    /// `CallId` is process-globally unique for practical purposes (64 bits
    /// of randomness); it is not guaranteed unique across processes or time.
    pub fn random() -> Self {
        Self(rand::thread_rng().next_u64())
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Format this id together with a remote device, for log lines that
    /// need to identify both the call and which of the remote's devices a
    /// message concerns.
    pub fn format(self, device_id: DeviceId) -> String {
        format!("0x{:x}-{}", self.0, device_id)
    }
}

impl From<u64> for CallId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Identifier for one of the remote party's devices.
///
/// A single call may involve multiple remote devices during offer fan-out;
/// at most one is ever selected by an answer.
pub type DeviceId = u32;

/// The direction a call was established in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallDirection {
    /// The local application placed the call.
    Outbound,
    /// The call arrived via `receive_offer`.
    Inbound,
}

impl fmt::Display for CallDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Application-visible domain events, delivered through `Platform::on_event`.
///
/// The numbering is stable: it is the wire-to-UI boundary referenced by
/// embedding applications, so variants are only ever appended, never
/// renumbered or removed.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplicationEvent {
    RingingLocal = 0,
    RingingRemote = 1,
    ConnectedLocal = 2,
    ConnectedRemote = 3,
    EndedLocalHangup = 4,
    EndedRemoteHangup = 5,
    EndedRemoteBusy = 6,
    EndedRemoteGlare = 7,
    EndedTimeout = 8,
    EndedInternalFailure = 9,
    EndedSignalingFailure = 10,
    EndedConnectionFailure = 11,
    EndedDropped = 12,
    RemoteVideoEnable = 13,
    RemoteVideoDisable = 14,
    Reconnecting = 15,
    Reconnected = 16,
    EndedReceivedOfferExpired = 17,
    EndedReceivedOfferWhileActive = 18,
}

impl fmt::Display for ApplicationEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
