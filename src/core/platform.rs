//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! The `Platform` trait: the single seam between this crate and an embedding
//! application.
//!
//! Everything the core cannot do for itself — actually transmitting
//! signaling bytes, actually building a WebRTC peer connection, actually
//! telling a UI that the phone is ringing — goes through here. A `Platform`
//! implementation is expected to do as little work as possible on the
//! calling thread (the event thread, see `core::handle`) and hand real work
//! off elsewhere.

use crate::common::{ApplicationEvent, CallDirection, CallId, DeviceId};
use crate::core::call_context::CallContext;
use crate::core::signaling::{Answer, IceCandidate, Offer};
use crate::error::Result;

/// Marker bound for the opaque, application-owned values that flow through
/// the core without the core ever inspecting them.
pub trait PlatformItem: Clone + Send + 'static {}
impl<T: Clone + Send + 'static> PlatformItem for T {}

/// A WebRTC ICE server description, passed through to connection setup
/// untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub password: String,
}

impl IceServer {
    pub fn new(urls: Vec<String>, username: String, password: String) -> Self {
        Self {
            urls,
            username,
            password,
        }
    }
}

/// The capability bundle an application implements to embed this crate.
///
/// Every method is called from the single event thread that owns the
/// `CallManager` (see `core::handle::CallManagerHandle`); implementations
/// must not block it on I/O or UI work.
pub trait Platform: Sized {
    /// Opaque handle to "who we are calling". Usually wraps a user/contact
    /// identifier plus whatever routing information the application needs
    /// to reach them.
    type AppRemotePeer: PlatformItem;

    /// Opaque per-call bag of application state: outgoing media tracks,
    /// capture devices, and anything else the application needs to recall
    /// for the lifetime of one call. The core never looks inside it.
    type AppCallContext: PlatformItem;

    /// Opaque handle to an established peer connection, as returned by
    /// `create_connection`.
    type AppConnection: PlatformItem;

    /// Opaque handle to a remote video track, as surfaced by
    /// `on_add_remote_video_track`. The core never decodes or renders it.
    type AppVideoTrack: PlatformItem;

    /// Opaque handle to a local video capture session, as surfaced by
    /// `on_update_local_video_session`.
    type AppVideoSession: PlatformItem;

    /// Tell the application a call has begun and it should build a
    /// `CallContext` and call `proceed()` (or, for an inbound call the
    /// application doesn't want to auto-answer, wait for the user and then
    /// call `accept()`). This fires at most once per call, before any other
    /// `Platform` callback for it.
    fn on_start_call(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        direction: CallDirection,
    ) -> Result<()>;

    /// Construct a peer connection for `call_id`/`device_id`, configured
    /// with the ICE servers and IP-hiding policy carried in `context`, and
    /// produce the local session description to send: an offer when
    /// `remote_offer` is `None` (outbound), an answer to `remote_offer`
    /// otherwise (inbound). Real SDP offer/answer negotiation is
    /// necessarily asynchronous in WebRTC; implementations are expected to
    /// block this call until it completes rather than exposing that
    /// asynchrony to the core, which has no use for it.
    ///
    /// The returned connection is retained by the call record and handed
    /// back to later `Platform` calls.
    fn create_connection(
        &self,
        call_id: CallId,
        device_id: DeviceId,
        context: &CallContext<Self>,
        remote_offer: Option<&str>,
    ) -> Result<(Self::AppConnection, String)>;

    /// Apply a received answer's SDP to an already-established connection.
    fn accept_answer(&self, call_id: CallId, connection: &Self::AppConnection, sdp: String) -> Result<()>;

    /// Hand received ICE candidates to an already-established connection.
    fn add_ice_candidates(
        &self,
        call_id: CallId,
        connection: &Self::AppConnection,
        candidates: Vec<IceCandidate>,
    ) -> Result<()>;

    /// Compare two remote-peer handles for glare/identity purposes. Must be
    /// synchronous and side-effect free: the event thread blocks on it.
    fn compare_remotes(
        &self,
        remote1: &Self::AppRemotePeer,
        remote2: &Self::AppRemotePeer,
    ) -> Result<bool>;

    /// Enable or disable the local outgoing audio track on an established
    /// connection. Routed from `CallManagerHandle::set_local_audio_enabled`.
    fn set_audio_enabled(&self, call_id: CallId, connection: &Self::AppConnection, enabled: bool) -> Result<()>;

    /// Enable or disable the local outgoing video track. Returns the new
    /// local capture session (if now enabled) so the core can hand it back
    /// to the application via `on_update_local_video_session`.
    fn set_video_enabled(
        &self,
        call_id: CallId,
        connection: &Self::AppConnection,
        enabled: bool,
    ) -> Result<Option<Self::AppVideoSession>>;

    /// Switch the local camera between front- and rear-facing, if a capture
    /// session is currently active.
    fn set_camera_source(&self, call_id: CallId, connection: &Self::AppConnection, use_front_camera: bool) -> Result<()>;

    /// Request that `offer` be sent to `remote`. `broadcast` is true for
    /// outbound fan-out (no specific destination device yet known).
    fn on_send_offer(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        broadcast: bool,
        offer: Offer,
    ) -> Result<()>;

    /// Request that `answer` be sent back to the offering device.
    fn on_send_answer(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        dest_device: DeviceId,
        answer: Answer,
    ) -> Result<()>;

    /// Request that the given ICE candidates be sent to `remote`.
    /// `dest_device` is `None` while the remote device hasn't been selected
    /// yet (outbound, pre-answer).
    fn on_send_ice_candidates(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        dest_device: Option<DeviceId>,
        candidates: Vec<IceCandidate>,
    ) -> Result<()>;

    /// Request that a hangup be sent to `remote` (or broadcast to every
    /// contacted device, if `dest_device` is `None`).
    fn on_send_hangup(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        dest_device: Option<DeviceId>,
    ) -> Result<()>;

    /// Request that a busy indication be sent to `remote`.
    fn on_send_busy(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        dest_device: Option<DeviceId>,
    ) -> Result<()>;

    /// Deliver a domain-level event (ringing, connected, ended, ...) for
    /// `remote`/`call_id` to the application.
    fn on_event(&self, call_id: CallId, remote: &Self::AppRemotePeer, event: ApplicationEvent);

    /// Called once a call has fully concluded, so the application can
    /// release any resources it keyed off `call_id`. The record itself
    /// lingers in the registry (terminal state, awaiting cleanup) rather
    /// than being dropped here.
    fn on_call_concluded(&self, call_id: CallId, remote: &Self::AppRemotePeer);

    /// The local outgoing video session changed (enabled, disabled, or
    /// replaced by `set_camera_source`). `session` is `None` when video was
    /// just disabled.
    fn on_update_local_video_session(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        session: Option<Self::AppVideoSession>,
    );

    /// The remote party's media stream included a video track, surfaced the
    /// first time `CallManagerHandle::on_connect_media` reports one.
    fn on_add_remote_video_track(&self, call_id: CallId, remote: &Self::AppRemotePeer, track: Self::AppVideoTrack);

    /// Whether this `Platform` acknowledges sent messages out-of-band
    /// (`false`, the default and the production behavior: the dispatcher
    /// waits for an explicit `message_sent`/`message_send_failure` call) or
    /// whether every `on_send_*` call should be treated as immediately
    /// successful. Test doubles that don't model network latency may prefer
    /// the latter.
    fn assume_messages_sent(&self) -> bool {
        false
    }
}
