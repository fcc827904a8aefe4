//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! The peer-connection coordinator.
//!
//! A call has at most one peer connection. For outbound calls it is created
//! eagerly at `proceed()` time and a single SDP offer is fanned out to every
//! contacted device; whichever device answers first is latched as the
//! `selected_device` and every later answer is ignored. For inbound calls
//! the remote device is already known from the offer, so the connection is
//! created for that device directly. This deliberately skips per-device
//! connection forking (parent/child connection objects, one per offered
//! device): the actual WebRTC ICE-fork mechanics live entirely inside the
//! external peer-connection factory, which is out of scope here, so there is
//! nothing left for this crate to fork.

use crate::core::platform::IceServer;

/// Events the coordinator reacts to, reported by the application through
/// whatever observer the external peer-connection factory exposes.
///
/// `IceConnected` is deliberately reused for two different transitions
/// (`Proceeding`/`Accepting` -> `Ringing`-class states, and restoring from
/// `Reconnecting`): both are "ICE/DTLS just finished (again)", and
/// `CallManager::handle_connection_event` tells them apart by the state the
/// call was already in, re-dispatching on `CallState` rather than giving
/// "reconnect" its own event variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// ICE/DTLS (re)established.
    IceConnected,
    /// ICE connectivity lost; the call enters `CallState::Reconnecting` if
    /// it was `Connected`.
    IceDisconnected,
    /// ICE connectivity failed outright and will not recover.
    IceFailed,
    /// The remote party enabled or disabled their outgoing video track.
    RemoteVideoToggled { enabled: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BundlePolicy {
    MaxBundle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RtcpMuxPolicy {
    Require,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IceTransportPolicy {
    /// Only relay candidates are gathered, used when the call context asked
    /// to hide the caller's IP.
    Relay,
    All,
}

/// The policy a peer connection is built with, derived from a
/// `CallContext`'s `ice_servers`/`hide_ip`.
#[derive(Clone, Debug)]
pub struct PeerConnectionConfig {
    pub ice_servers: Vec<IceServer>,
    pub bundle_policy: BundlePolicy,
    pub rtcp_mux_policy: RtcpMuxPolicy,
    pub ice_transport_policy: IceTransportPolicy,
    /// Always required; not derived from the call context like the other
    /// fields, but still part of the contract every `Platform` impl must
    /// honor when it actually configures the peer connection (§4.2).
    pub dtls_srtp_key_agreement: bool,
}

impl PeerConnectionConfig {
    pub fn for_call(ice_servers: Vec<IceServer>, hide_ip: bool) -> Self {
        Self {
            ice_servers,
            bundle_policy: BundlePolicy::MaxBundle,
            rtcp_mux_policy: RtcpMuxPolicy::Require,
            ice_transport_policy: if hide_ip {
                IceTransportPolicy::Relay
            } else {
                IceTransportPolicy::All
            },
            dtls_srtp_key_agreement: true,
        }
    }
}
