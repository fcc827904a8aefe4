//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! An in-process test double `Platform`, gated behind the `sim` feature so
//! production builds never pull it in. `CallManager<SimPlatform>` is built
//! and driven directly and synchronously in tests, no threads or real media
//! required.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::{ApplicationEvent, CallDirection, CallId, DeviceId};
use crate::core::call_context::CallContext;
use crate::core::connection::PeerConnectionConfig;
use crate::core::platform::Platform;
use crate::core::signaling::{Answer, IceCandidate, Offer};
use crate::error::{CallError, Result};

/// One entry in `SimPlatform`'s application-visible event log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    StartCall {
        call_id: CallId,
        remote: String,
        direction: CallDirection,
    },
    App {
        call_id: CallId,
        remote: String,
        event: ApplicationEvent,
    },
    CallConcluded {
        call_id: CallId,
        remote: String,
    },
    LocalVideoSession {
        call_id: CallId,
        remote: String,
        session: Option<String>,
    },
    RemoteVideoTrack {
        call_id: CallId,
        remote: String,
        track: String,
    },
    IceAdded {
        call_id: CallId,
        connection: String,
        candidates: Vec<IceCandidate>,
    },
}

/// One entry in `SimPlatform`'s outbound-directive log (what the dispatcher
/// asked to have sent over signaling).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentDirective {
    Offer {
        call_id: CallId,
        remote: String,
        sdp: String,
    },
    Answer {
        call_id: CallId,
        remote: String,
        dest_device: DeviceId,
        sdp: String,
    },
    Ice {
        call_id: CallId,
        remote: String,
        dest_device: Option<DeviceId>,
        candidates: Vec<IceCandidate>,
    },
    Hangup {
        call_id: CallId,
        remote: String,
        dest_device: Option<DeviceId>,
    },
    Busy {
        call_id: CallId,
        remote: String,
        dest_device: Option<DeviceId>,
    },
}

/// Simulation implementation of `core::platform::Platform`.
///
/// Remote peers, call contexts, connections, and video tracks are all
/// plain `String`s: enough to assert identity and content in tests without
/// a real media stack. Every callback records into a shared log instead of
/// doing anything; tests inspect the log afterward with `events()`/`sent()`.
#[derive(Clone, Default)]
pub struct SimPlatform {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    sent: Arc<Mutex<Vec<SentDirective>>>,
    force_create_connection_fault: Arc<AtomicBool>,
    force_signaling_fault: Arc<AtomicBool>,
    assume_messages_sent: Arc<AtomicBool>,
    /// The `PeerConnectionConfig` (§4.2) built for the most recent
    /// `create_connection` call, so tests can assert the `hide_ip` ->
    /// `IceTransportPolicy::Relay` derivation without a real factory.
    last_connection_config: Arc<Mutex<Option<PeerConnectionConfig>>>,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call and application event recorded so far, in order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Just the `ApplicationEvent`s recorded for `call_id`, in order.
    pub fn application_events(&self, call_id: CallId) -> Vec<ApplicationEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::App { call_id: id, event, .. } if id == call_id => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Every outbound directive dispatched so far, in order.
    pub fn sent(&self) -> Vec<SentDirective> {
        self.sent.lock().unwrap().clone()
    }

    /// Just the directives dispatched for `call_id`, in order.
    pub fn sent_for(&self, call_id: CallId) -> Vec<SentDirective> {
        self.sent()
            .into_iter()
            .filter(|d| sent_directive_call_id(d) == call_id)
            .collect()
    }

    /// From now on, `create_connection` fails with `CallError::InternalFailure`.
    pub fn force_create_connection_fault(&self, fault: bool) {
        self.force_create_connection_fault.store(fault, Ordering::SeqCst);
    }

    /// From now on, every `on_send_*` call fails immediately (simulating a
    /// transport that can't even hand the message off, as opposed to a
    /// message that is handed off and later fails via
    /// `CallManager::message_send_failure`).
    pub fn force_signaling_fault(&self, fault: bool) {
        self.force_signaling_fault.store(fault, Ordering::SeqCst);
    }

    /// Treat every successfully dispatched message as immediately
    /// acknowledged, so tests don't need to call `message_sent` themselves.
    pub fn set_assume_messages_sent(&self, assume: bool) {
        self.assume_messages_sent.store(assume, Ordering::SeqCst);
    }

    /// The `PeerConnectionConfig` the most recent `create_connection` call
    /// was built with, for asserting §4.2's `hide_ip` -> `Relay` derivation.
    pub fn last_connection_config(&self) -> Option<PeerConnectionConfig> {
        self.last_connection_config.lock().unwrap().clone()
    }

    /// Every ICE candidate handed to `add_ice_candidates` for `call_id`, in
    /// the order the calls were made (each call may carry more than one).
    pub fn ice_added_for(&self, call_id: CallId) -> Vec<IceCandidate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::IceAdded { call_id: id, candidates, .. } if id == call_id => Some(candidates),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

fn sent_directive_call_id(directive: &SentDirective) -> CallId {
    match directive {
        SentDirective::Offer { call_id, .. }
        | SentDirective::Answer { call_id, .. }
        | SentDirective::Ice { call_id, .. }
        | SentDirective::Hangup { call_id, .. }
        | SentDirective::Busy { call_id, .. } => *call_id,
    }
}

impl Platform for SimPlatform {
    type AppRemotePeer = String;
    type AppCallContext = String;
    type AppConnection = String;
    type AppVideoTrack = String;
    type AppVideoSession = String;

    fn on_start_call(&self, call_id: CallId, remote: &Self::AppRemotePeer, direction: CallDirection) -> Result<()> {
        self.events.lock().unwrap().push(RecordedEvent::StartCall {
            call_id,
            remote: remote.clone(),
            direction,
        });
        Ok(())
    }

    fn create_connection(
        &self,
        call_id: CallId,
        device_id: DeviceId,
        context: &CallContext<Self>,
        remote_offer: Option<&str>,
    ) -> Result<(Self::AppConnection, String)> {
        if self.force_create_connection_fault.load(Ordering::SeqCst) {
            return Err(CallError::InternalFailure(
                call_id,
                "simulated create_connection failure".to_string(),
            ));
        }
        let config = PeerConnectionConfig::for_call(context.ice_servers.clone(), context.hide_ip);
        *self.last_connection_config.lock().unwrap() = Some(config);
        let connection = format!("conn-{}-{}", call_id, device_id);
        let local_sdp = match remote_offer {
            Some(_) => format!("sdp-answer-{}", call_id),
            None => format!("sdp-offer-{}", call_id),
        };
        Ok((connection, local_sdp))
    }

    fn accept_answer(&self, _call_id: CallId, _connection: &Self::AppConnection, _sdp: String) -> Result<()> {
        Ok(())
    }

    fn add_ice_candidates(
        &self,
        call_id: CallId,
        connection: &Self::AppConnection,
        candidates: Vec<IceCandidate>,
    ) -> Result<()> {
        self.events.lock().unwrap().push(RecordedEvent::IceAdded {
            call_id,
            connection: connection.clone(),
            candidates,
        });
        Ok(())
    }

    fn compare_remotes(&self, remote1: &Self::AppRemotePeer, remote2: &Self::AppRemotePeer) -> Result<bool> {
        Ok(remote1 == remote2)
    }

    fn set_audio_enabled(&self, _call_id: CallId, _connection: &Self::AppConnection, _enabled: bool) -> Result<()> {
        Ok(())
    }

    fn set_video_enabled(
        &self,
        _call_id: CallId,
        connection: &Self::AppConnection,
        enabled: bool,
    ) -> Result<Option<Self::AppVideoSession>> {
        Ok(enabled.then(|| format!("video-session-{}", connection)))
    }

    fn set_camera_source(&self, _call_id: CallId, _connection: &Self::AppConnection, _use_front_camera: bool) -> Result<()> {
        Ok(())
    }

    fn on_send_offer(&self, call_id: CallId, remote: &Self::AppRemotePeer, _broadcast: bool, offer: Offer) -> Result<()> {
        if self.force_signaling_fault.load(Ordering::SeqCst) {
            return Err(CallError::SignalingFailure(call_id));
        }
        self.sent.lock().unwrap().push(SentDirective::Offer {
            call_id,
            remote: remote.clone(),
            sdp: offer.sdp,
        });
        Ok(())
    }

    fn on_send_answer(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        dest_device: DeviceId,
        answer: Answer,
    ) -> Result<()> {
        if self.force_signaling_fault.load(Ordering::SeqCst) {
            return Err(CallError::SignalingFailure(call_id));
        }
        self.sent.lock().unwrap().push(SentDirective::Answer {
            call_id,
            remote: remote.clone(),
            dest_device,
            sdp: answer.sdp,
        });
        Ok(())
    }

    fn on_send_ice_candidates(
        &self,
        call_id: CallId,
        remote: &Self::AppRemotePeer,
        dest_device: Option<DeviceId>,
        candidates: Vec<IceCandidate>,
    ) -> Result<()> {
        if self.force_signaling_fault.load(Ordering::SeqCst) {
            return Err(CallError::SignalingFailure(call_id));
        }
        self.sent.lock().unwrap().push(SentDirective::Ice {
            call_id,
            remote: remote.clone(),
            dest_device,
            candidates,
        });
        Ok(())
    }

    fn on_send_hangup(&self, call_id: CallId, remote: &Self::AppRemotePeer, dest_device: Option<DeviceId>) -> Result<()> {
        if self.force_signaling_fault.load(Ordering::SeqCst) {
            return Err(CallError::SignalingFailure(call_id));
        }
        self.sent.lock().unwrap().push(SentDirective::Hangup {
            call_id,
            remote: remote.clone(),
            dest_device,
        });
        Ok(())
    }

    fn on_send_busy(&self, call_id: CallId, remote: &Self::AppRemotePeer, dest_device: Option<DeviceId>) -> Result<()> {
        if self.force_signaling_fault.load(Ordering::SeqCst) {
            return Err(CallError::SignalingFailure(call_id));
        }
        self.sent.lock().unwrap().push(SentDirective::Busy {
            call_id,
            remote: remote.clone(),
            dest_device,
        });
        Ok(())
    }

    fn on_event(&self, call_id: CallId, remote: &Self::AppRemotePeer, event: ApplicationEvent) {
        self.events.lock().unwrap().push(RecordedEvent::App {
            call_id,
            remote: remote.clone(),
            event,
        });
    }

    fn on_call_concluded(&self, call_id: CallId, remote: &Self::AppRemotePeer) {
        self.events.lock().unwrap().push(RecordedEvent::CallConcluded {
            call_id,
            remote: remote.clone(),
        });
    }

    fn on_update_local_video_session(&self, call_id: CallId, remote: &Self::AppRemotePeer, session: Option<Self::AppVideoSession>) {
        self.events.lock().unwrap().push(RecordedEvent::LocalVideoSession {
            call_id,
            remote: remote.clone(),
            session,
        });
    }

    fn on_add_remote_video_track(&self, call_id: CallId, remote: &Self::AppRemotePeer, track: Self::AppVideoTrack) {
        self.events.lock().unwrap().push(RecordedEvent::RemoteVideoTrack {
            call_id,
            remote: remote.clone(),
            track,
        });
    }

    fn assume_messages_sent(&self) -> bool {
        self.assume_messages_sent.load(Ordering::SeqCst)
    }
}
