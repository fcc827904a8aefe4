//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Signaling message vocabulary.
//!
//! These types describe message *semantics* only. Turning them into bytes
//! on a wire, and getting those bytes to the other party, is the
//! application's job; the core never serializes anything itself.

use std::time::SystemTime;

use crate::common::DeviceId;

/// A single ICE candidate. Immutable once constructed (§3): the core only
/// ever buffers, replays, and forwards these, never inspects their contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IceCandidate {
    pub sdp_mid: String,
    pub sdp_mline_index: i32,
    pub sdp: String,
}

impl IceCandidate {
    pub fn new(sdp_mid: String, sdp_mline_index: i32, sdp: String) -> Self {
        Self {
            sdp_mid,
            sdp_mline_index,
            sdp,
        }
    }
}

/// A session description offer, as produced by the local peer connection or
/// carried in from `receive_offer`.
#[derive(Clone, Debug)]
pub struct Offer {
    pub sdp: String,
}

/// A session description answer.
#[derive(Clone, Debug)]
pub struct Answer {
    pub sdp: String,
}

/// What a received offer was for; carried alongside the SDP so the core can
/// enforce the freshness check independent of any particular transport's
/// notion of "received at".
#[derive(Clone, Debug)]
pub struct ReceivedOffer {
    pub sdp: String,
    pub sent_at: SystemTime,
}

/// One outbound item a call may need to hand to the application. The
/// manager's signaling dispatcher keeps at most one of these "in flight" per
/// call at a time (see `core::call::CallRecord::outbound_in_flight`).
#[derive(Clone, Debug)]
pub(crate) enum OutboundDirective {
    Offer {
        sdp: String,
    },
    Answer {
        dest_device: DeviceId,
        sdp: String,
    },
    Ice {
        dest_device: Option<DeviceId>,
        candidates: Vec<IceCandidate>,
    },
    Hangup {
        dest_device: Option<DeviceId>,
    },
}

impl OutboundDirective {
    /// Essential messages (offer, answer) end the call as
    /// `TerminateReason::SignalingFailure` if they fail to send; everything
    /// else is best-effort and is simply dropped on failure.
    pub fn is_essential(&self) -> bool {
        matches!(self, OutboundDirective::Offer { .. } | OutboundDirective::Answer { .. })
    }
}
