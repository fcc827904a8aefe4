//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! The per-call record.
//!
//! An earlier FFI-era design wrapped this in `Arc<Mutex<_>>` and cloned it
//! across several runtimes (FSM, network, notify). This crate has exactly
//! one writer (the event thread owned by `core::handle`), so the registry
//! can hold plain owned records with no interior mutability at all.

use std::collections::{HashSet, VecDeque};
use std::time::{Instant, SystemTime};

use crate::common::{CallDirection, CallId, DeviceId};
use crate::core::call_context::CallContext;
use crate::core::call_state::CallState;
use crate::core::platform::Platform;
use crate::core::signaling::{IceCandidate, OutboundDirective};

pub(crate) struct CallRecord<P: Platform> {
    pub id: CallId,
    pub remote: P::AppRemotePeer,
    pub direction: CallDirection,
    pub state: CallState,

    pub created_at: Instant,
    pub connected_at: Option<Instant>,
    pub reconnecting_since: Option<Instant>,

    /// Inbound only: when the offer claims to have been sent, used for the
    /// freshness check in `receive_offer`/`proceed`.
    pub offer_sent_at: Option<SystemTime>,
    /// Inbound only: the offer SDP, stashed between `receive_offer` and
    /// `proceed`/`accept`.
    pub offer_sdp: Option<String>,

    pub context: Option<CallContext<P>>,
    pub connection: Option<P::AppConnection>,

    /// Every device an offer was (or will be) sent to. For inbound calls
    /// this is the single originating device.
    pub device_list: Vec<DeviceId>,
    /// The device whose answer was accepted, once one has been.
    pub selected_device: Option<DeviceId>,

    /// Every device an outbound Offer/Answer/Ice message was actually
    /// addressed to, so a final `hangup()` targets exactly the devices that
    /// heard about the call rather than a bare broadcast.
    pub contacted_devices: HashSet<DeviceId>,

    /// ICE candidates received before `connection` exists, alongside which
    /// device they arrived from.
    pub pending_ice_in: Vec<(DeviceId, IceCandidate)>,
    /// Locally gathered candidates waiting for a device to send them to
    /// (outbound, before an answer selects one).
    pub pending_ice_out: VecDeque<IceCandidate>,

    pub outbound_queue: VecDeque<OutboundDirective>,
    pub outbound_in_flight: Option<OutboundDirective>,
}

impl<P: Platform> CallRecord<P> {
    pub fn new_outbound(id: CallId, remote: P::AppRemotePeer, device_list: Vec<DeviceId>) -> Self {
        Self {
            id,
            remote,
            direction: CallDirection::Outbound,
            state: CallState::Idle,
            created_at: Instant::now(),
            connected_at: None,
            reconnecting_since: None,
            offer_sent_at: None,
            offer_sdp: None,
            context: None,
            connection: None,
            device_list,
            selected_device: None,
            contacted_devices: HashSet::new(),
            pending_ice_in: Vec::new(),
            pending_ice_out: VecDeque::new(),
            outbound_queue: VecDeque::new(),
            outbound_in_flight: None,
        }
    }

    pub fn new_inbound(
        id: CallId,
        remote: P::AppRemotePeer,
        src_device: DeviceId,
        offer_sdp: String,
        offer_sent_at: SystemTime,
    ) -> Self {
        Self {
            id,
            remote,
            direction: CallDirection::Inbound,
            state: CallState::Idle,
            created_at: Instant::now(),
            connected_at: None,
            reconnecting_since: None,
            offer_sent_at: Some(offer_sent_at),
            offer_sdp: Some(offer_sdp),
            context: None,
            connection: None,
            device_list: vec![src_device],
            selected_device: Some(src_device),
            contacted_devices: HashSet::new(),
            pending_ice_in: Vec::new(),
            pending_ice_out: VecDeque::new(),
            outbound_queue: VecDeque::new(),
            outbound_in_flight: None,
        }
    }

    pub fn enqueue_outbound(&mut self, directive: OutboundDirective) {
        self.outbound_queue.push_back(directive);
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, CallState::Terminated(_))
    }
}
