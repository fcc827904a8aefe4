//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! `CallManager`: the façade, the call registry, the signaling dispatcher,
//! and the event emitter rolled into one. The only thing factored out is the
//! background thread itself, which lives in `core::handle` so this type can
//! stay synchronous and easy to test directly (see `sim::SimPlatform`).

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};

use crate::common::config::Config;
use crate::common::time::saturating_epoch_time;
use crate::common::{ApplicationEvent, CallDirection, CallId, DeviceId};
use crate::core::arbiter::{resolve_glare, GlareOutcome};
use crate::core::call::CallRecord;
use crate::core::call_context::CallContext;
use crate::core::call_fsm::{log_unexpected_event, CallEvent};
use crate::core::call_state::{CallState, TerminateReason};
use crate::core::connection::ConnectionEvent;
use crate::core::platform::{IceServer, Platform};
use crate::core::signaling::{Answer, IceCandidate, Offer, OutboundDirective, ReceivedOffer};
use crate::error::{CallError, Result};

pub struct CallManager<P: Platform> {
    platform: P,
    config: Config,
    calls: HashMap<CallId, CallRecord<P>>,
    active_call_id: Option<CallId>,
}

impl<P: Platform> CallManager<P> {
    pub fn new(platform: P, config: Config) -> Self {
        Self {
            platform,
            config,
            calls: HashMap::new(),
            active_call_id: None,
        }
    }

    pub fn active_call_id(&self) -> Option<CallId> {
        self.active_call_id
    }

    pub fn call_state(&self, call_id: CallId) -> Option<CallState> {
        self.calls.get(&call_id).map(|c| c.state)
    }

    // ----- application-facing API -----

    /// Place an outbound call to `remote`, fanning an offer out to every
    /// device in `device_list`.
    pub fn call(&mut self, remote: P::AppRemotePeer, device_list: Vec<DeviceId>) -> Result<CallId> {
        if let Some(active_id) = self.active_call_id {
            return Err(CallError::InvalidState(
                active_id,
                "manager already has an active call".to_string(),
            ));
        }
        let call_id = CallId::random();
        info!("call(): call_id: {} placing outbound call", call_id);

        let mut record = CallRecord::new_outbound(call_id, remote.clone(), device_list);
        record.state = CallState::Starting;
        self.calls.insert(call_id, record);
        self.active_call_id = Some(call_id);

        if let Err(e) = self.platform.on_start_call(call_id, &remote, CallDirection::Outbound) {
            warn!("call(): call_id: {} on_start_call failed: {}", call_id, e);
            self.terminate_call(call_id, TerminateReason::InternalFailure);
            return Err(e);
        }
        Ok(call_id)
    }

    /// Handle an inbound offer arriving over signaling.
    pub fn receive_offer(
        &mut self,
        remote: P::AppRemotePeer,
        call_id: CallId,
        src_device: DeviceId,
        received: ReceivedOffer,
    ) -> Result<()> {
        if saturating_epoch_time(received.sent_at) > self.config.max_offer_age {
            // P4: no `ShouldStartCall` for a stale offer, but the
            // application still learns it existed and was rejected.
            warn!("receive_offer(): call_id: {} dropping stale offer", call_id);
            self.platform
                .on_event(call_id, &remote, ApplicationEvent::EndedReceivedOfferExpired);
            return Ok(());
        }

        if let Some(active_id) = self.active_call_id {
            // True glare (per §4.4) only applies when *we* originated a call
            // to the same remote and haven't connected yet; every other
            // "already have an active call" case is the generic
            // offer-while-active rejection, which leaves the active call
            // untouched (P5).
            let is_glare = {
                let active = self
                    .calls
                    .get(&active_id)
                    .expect("active_call_id always names a live record");
                active.direction == CallDirection::Outbound
                    && matches!(active.state, CallState::Starting | CallState::Proceeding | CallState::Ringing)
                    && self.platform.compare_remotes(&active.remote, &remote).unwrap_or(false)
            };

            if is_glare {
                match resolve_glare(active_id, call_id) {
                    GlareOutcome::IncomingWins => {
                        info!(
                            "receive_offer(): call_id: {} won glare against active call {}",
                            call_id, active_id
                        );
                        self.terminate_call(active_id, TerminateReason::RemoteGlare);
                        // Falls through: the winning offer is surfaced below,
                        // exactly as a fresh inbound call would be.
                    }
                    GlareOutcome::ExistingWins => {
                        info!(
                            "receive_offer(): call_id: {} lost glare to active call {}",
                            call_id, active_id
                        );
                        self.platform
                            .on_event(call_id, &remote, ApplicationEvent::EndedRemoteGlare);
                        return Ok(());
                    }
                }
            } else {
                info!(
                    "receive_offer(): call_id: {} busy with active call {}",
                    call_id, active_id
                );
                if let Err(e) = self.platform.on_send_busy(call_id, &remote, Some(src_device)) {
                    warn!("receive_offer(): call_id: {} failed to send busy: {}", call_id, e);
                }
                self.platform
                    .on_event(call_id, &remote, ApplicationEvent::EndedReceivedOfferWhileActive);
                return Ok(());
            }
        }

        let mut record = CallRecord::new_inbound(call_id, remote.clone(), src_device, received.sdp, received.sent_at);
        record.state = CallState::Starting;
        self.calls.insert(call_id, record);
        self.active_call_id = Some(call_id);

        if let Err(e) = self.platform.on_start_call(call_id, &remote, CallDirection::Inbound) {
            warn!("receive_offer(): call_id: {} on_start_call failed: {}", call_id, e);
            self.terminate_call(call_id, TerminateReason::InternalFailure);
            return Err(e);
        }
        Ok(())
    }

    /// Build the connection, generate the local session description
    /// (offer for outbound, answer for inbound), and enqueue it for
    /// sending.
    pub fn proceed(
        &mut self,
        call_id: CallId,
        app_context: P::AppCallContext,
        ice_servers: Vec<IceServer>,
        hide_ip: bool,
    ) -> Result<()> {
        let direction = {
            let record = self.get_record(call_id)?;
            if record.state != CallState::Starting {
                return Err(CallError::InvalidState(call_id, format!("{}", record.state)));
            }
            record.direction
        };

        if direction == CallDirection::Inbound {
            let offer_sent_at = self.get_record(call_id)?.offer_sent_at;
            if let Some(sent_at) = offer_sent_at {
                if saturating_epoch_time(sent_at) > self.config.max_offer_age {
                    self.terminate_call(call_id, TerminateReason::ReceivedOfferExpired);
                    return Ok(());
                }
            }
        }

        let remote_offer_sdp = self.get_record(call_id)?.offer_sdp.clone();
        let device = {
            let record = self.get_record(call_id)?;
            record
                .selected_device
                .or_else(|| record.device_list.first().copied())
                .ok_or_else(|| CallError::InternalFailure(call_id, "no device to connect to".to_string()))?
        };

        let context = CallContext::new(ice_servers, hide_ip, app_context);
        let (connection, local_sdp) = self.platform.create_connection(
            call_id,
            device,
            &context,
            remote_offer_sdp.as_deref(),
        )?;

        let record = self.get_record_mut(call_id)?;
        record.context = Some(context);
        record.connection = Some(connection);
        record.state = CallState::Proceeding;

        match direction {
            CallDirection::Outbound => {
                record.enqueue_outbound(OutboundDirective::Offer { sdp: local_sdp });
            }
            CallDirection::Inbound => {
                record.enqueue_outbound(OutboundDirective::Answer {
                    dest_device: device,
                    sdp: local_sdp,
                });
            }
        }
        self.dispatch_next(call_id);
        self.replay_buffered_ice(call_id, device);
        Ok(())
    }

    /// The application (user) has answered an inbound, still-`Ringing`
    /// call. Enables local audio if the connection is already up; the
    /// answer itself was already enqueued by `proceed()`, so there is
    /// nothing left to send here in the common case.
    pub fn accept(&mut self, call_id: CallId) -> Result<()> {
        let record = self.get_record(call_id)?;
        if record.direction != CallDirection::Inbound || record.state != CallState::Ringing {
            return Err(CallError::InvalidState(call_id, format!("{}", record.state)));
        }
        if let Some(connection) = record.connection.clone() {
            self.platform.set_audio_enabled(call_id, &connection, true)?;
        }
        self.set_state(call_id, CallState::Accepting);
        Ok(())
    }

    /// Tear the call down from the local side.
    pub fn hangup(&mut self, call_id: CallId) -> Result<()> {
        self.get_record(call_id)?;
        self.terminate_call(call_id, TerminateReason::LocalHangup);
        Ok(())
    }

    /// Silently discard a `Pending` inbound call the application chose not
    /// to surface to the user. No `ApplicationEvent` is emitted (I4 still
    /// holds: nothing further is emitted for this `CallId` afterward).
    pub fn drop_call(&mut self, call_id: CallId) -> Result<()> {
        self.get_record(call_id)?;
        self.terminate_call(call_id, TerminateReason::Dropped);
        Ok(())
    }

    /// Hard teardown of every live call, with no application notification,
    /// used after the application hits an error it can't otherwise recover
    /// from: conclude all calls and clear the active call id without
    /// notifying the application.
    pub fn reset(&mut self) {
        let call_ids: Vec<CallId> = self.calls.keys().copied().collect();
        for call_id in call_ids {
            self.terminate_call(call_id, TerminateReason::Dropped);
        }
        self.active_call_id = None;
    }

    /// Report that the remote media stream has arrived (`OnConnectMedia`):
    /// the last handshake step before a `Ringing`/`Accepting` call is fully
    /// `Connected`. `remote_video_track` is `Some` the first time the
    /// stream is found to carry video (§4.2); a later toggle is reported
    /// through `connection_event(ConnectionEvent::RemoteVideoToggled)`
    /// instead.
    pub fn on_connect_media(&mut self, call_id: CallId, remote_video_track: Option<P::AppVideoTrack>) -> Result<()> {
        let record = self.get_record(call_id)?;
        if !matches!(record.state, CallState::Ringing | CallState::Accepting) {
            log_unexpected_event(
                call_id,
                &record.state,
                &CallEvent::Connection(ConnectionEvent::IceConnected),
            );
            return Ok(());
        }
        let direction = record.direction;
        let remote = record.remote.clone();

        self.set_state(call_id, CallState::Connected);
        self.get_record_mut(call_id)?.connected_at = Some(Instant::now());

        // S1: the side that didn't initiate the local UI action for this
        // call hears about the other side connecting first.
        let (first, second) = match direction {
            CallDirection::Outbound => (ApplicationEvent::ConnectedRemote, ApplicationEvent::ConnectedLocal),
            CallDirection::Inbound => (ApplicationEvent::ConnectedLocal, ApplicationEvent::ConnectedRemote),
        };
        self.platform.on_event(call_id, &remote, first);
        self.platform.on_event(call_id, &remote, second);

        if let Some(track) = remote_video_track {
            self.platform.on_add_remote_video_track(call_id, &remote, track);
        } else {
            debug!("call_id: {} remote stream carries no video track", call_id);
        }
        Ok(())
    }

    /// Enable or disable the local outgoing audio track of the active call.
    pub fn set_local_audio_enabled(&mut self, enabled: bool) -> Result<()> {
        let call_id = self.active_call_id.ok_or(CallError::NoActiveCall)?;
        let connection = self
            .get_record(call_id)?
            .connection
            .clone()
            .ok_or_else(|| CallError::ConnectionNotFound(call_id))?;
        self.platform.set_audio_enabled(call_id, &connection, enabled)
    }

    /// Enable or disable the local outgoing video track of `call_id`,
    /// notifying the application of the resulting capture session.
    pub fn set_local_video_enabled(&mut self, enabled: bool, call_id: CallId) -> Result<()> {
        let record = self.get_record(call_id)?;
        let remote = record.remote.clone();
        let connection = record
            .connection
            .clone()
            .ok_or_else(|| CallError::ConnectionNotFound(call_id))?;
        let session = self.platform.set_video_enabled(call_id, &connection, enabled)?;
        self.platform.on_update_local_video_session(call_id, &remote, session);
        Ok(())
    }

    /// Switch the active call's camera between front- and rear-facing.
    pub fn set_camera_source(&mut self, use_front_camera: bool) -> Result<()> {
        let call_id = self.active_call_id.ok_or(CallError::NoActiveCall)?;
        let connection = self
            .get_record(call_id)?
            .connection
            .clone()
            .ok_or_else(|| CallError::ConnectionNotFound(call_id))?;
        self.platform.set_camera_source(call_id, &connection, use_front_camera)
    }

    // ----- signaling inbound -----

    pub fn received_answer(&mut self, call_id: CallId, src_device: DeviceId, sdp: String) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::ReceivedAnswer { src_device, sdp })
    }

    pub fn received_ice(&mut self, call_id: CallId, src_device: DeviceId, candidates: Vec<IceCandidate>) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::ReceivedIce { src_device, candidates })
    }

    pub fn received_hangup(&mut self, call_id: CallId) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::ReceivedHangup)
    }

    pub fn received_busy(&mut self, call_id: CallId) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::ReceivedBusy)
    }

    // ----- connection/signaling acks coming back from the platform -----

    pub fn connection_event(&mut self, call_id: CallId, event: ConnectionEvent) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::Connection(event))
    }

    pub fn message_sent(&mut self, call_id: CallId) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::MessageSent)
    }

    pub fn message_send_failure(&mut self, call_id: CallId) -> Result<()> {
        self.dispatch_call_event(call_id, CallEvent::MessageSendFailure)
    }

    /// Periodic housekeeping: setup/reconnect timeouts. The application is
    /// expected to call this on some regular cadence (a second or so) from
    /// the same thread it makes every other `CallManager` call from.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let expired_setup: Vec<CallId> = self
            .calls
            .values()
            .filter(|c| {
                !c.is_terminated()
                    && c.state != CallState::Connected
                    && c.state != CallState::Reconnecting
                    && now.duration_since(c.created_at) > self.config.setup_timeout
            })
            .map(|c| c.id)
            .collect();
        for call_id in expired_setup {
            warn!("tick(): call_id: {} setup timed out", call_id);
            self.terminate_call(call_id, TerminateReason::Timeout);
        }

        let expired_reconnect: Vec<CallId> = self
            .calls
            .values()
            .filter_map(|c| {
                let since = c.reconnecting_since?;
                (now.duration_since(since) > self.config.reconnect_timeout).then_some(c.id)
            })
            .collect();
        for call_id in expired_reconnect {
            warn!("tick(): call_id: {} reconnect budget exhausted", call_id);
            self.terminate_call(call_id, TerminateReason::ConnectionFailure);
        }
    }

    // ----- internal dispatch -----

    fn dispatch_call_event(&mut self, call_id: CallId, event: CallEvent) -> Result<()> {
        if !self.calls.contains_key(&call_id) {
            return Err(CallError::CallIdNotFound(call_id));
        }
        match event {
            CallEvent::ReceivedAnswer { src_device, sdp } => self.handle_received_answer(call_id, src_device, sdp),
            CallEvent::ReceivedIce { src_device, candidates } => {
                self.handle_received_ice(call_id, src_device, candidates)
            }
            CallEvent::ReceivedHangup => {
                self.terminate_call(call_id, TerminateReason::RemoteHangup);
                Ok(())
            }
            CallEvent::ReceivedBusy => {
                self.terminate_call(call_id, TerminateReason::RemoteBusy);
                Ok(())
            }
            CallEvent::Connection(conn_event) => self.handle_connection_event(call_id, conn_event),
            CallEvent::MessageSent => self.handle_message_sent(call_id),
            CallEvent::MessageSendFailure => self.handle_message_send_failure(call_id),
        }
    }

    fn handle_received_answer(&mut self, call_id: CallId, src_device: DeviceId, sdp: String) -> Result<()> {
        let record = self.get_record(call_id)?;
        // An answer typically arrives before ICE/DTLS completes (S1: answer,
        // then ICE, then `RingingRemote`), so the call is still `Proceeding`
        // here; a late answer while already `Ringing` is also accepted.
        if !matches!(record.state, CallState::Proceeding | CallState::Ringing) || record.direction != CallDirection::Outbound {
            log_unexpected_event(call_id, &record.state, &CallEvent::ReceivedAnswer { src_device, sdp: String::new() });
            return Ok(());
        }
        if record.selected_device.is_some() {
            debug!("received_answer(): call_id: {} ignoring answer from another device", call_id);
            return Ok(());
        }
        let connection = record
            .connection
            .clone()
            .ok_or_else(|| CallError::ConnectionNotFound(call_id))?;
        self.platform.accept_answer(call_id, &connection, sdp)?;

        let record = self.get_record_mut(call_id)?;
        record.selected_device = Some(src_device);
        self.replay_buffered_ice(call_id, src_device);
        self.flush_pending_ice_out(call_id, Some(src_device));
        Ok(())
    }

    fn handle_received_ice(&mut self, call_id: CallId, src_device: DeviceId, candidates: Vec<IceCandidate>) -> Result<()> {
        let record = self.get_record_mut(call_id)?;
        match &record.connection {
            Some(_) if record.selected_device.is_none() || record.selected_device == Some(src_device) => {
                let connection = record.connection.clone().unwrap();
                self.platform.add_ice_candidates(call_id, &connection, candidates)?;
            }
            Some(_) => {
                debug!(
                    "received_ice(): call_id: {} buffering candidates from non-selected device {}",
                    call_id, src_device
                );
                for c in candidates {
                    record.pending_ice_in.push((src_device, c));
                }
            }
            None => {
                for c in candidates {
                    record.pending_ice_in.push((src_device, c));
                }
            }
        }
        Ok(())
    }

    fn handle_connection_event(&mut self, call_id: CallId, event: ConnectionEvent) -> Result<()> {
        let record = self.get_record(call_id)?;
        match (record.state, &event) {
            // First ICE/DTLS completion: the call starts ringing. Full
            // media connection (and the `Connected` transition) waits for
            // `on_connect_media` separately (§4.2/§4.3).
            (CallState::Proceeding, ConnectionEvent::IceConnected) => {
                self.enter_ringing(call_id);
            }
            (CallState::Connected, ConnectionEvent::IceDisconnected) => {
                self.set_state(call_id, CallState::Reconnecting);
                self.get_record_mut(call_id)?.reconnecting_since = Some(Instant::now());
                let remote = self.get_record(call_id)?.remote.clone();
                self.platform.on_event(call_id, &remote, ApplicationEvent::Reconnecting);
            }
            (CallState::Reconnecting, ConnectionEvent::IceConnected) => {
                self.set_state(call_id, CallState::Connected);
                self.get_record_mut(call_id)?.reconnecting_since = None;
                let remote = self.get_record(call_id)?.remote.clone();
                self.platform.on_event(call_id, &remote, ApplicationEvent::Reconnected);
            }
            (_, ConnectionEvent::IceFailed) => {
                self.terminate_call(call_id, TerminateReason::ConnectionFailure);
            }
            (_, ConnectionEvent::RemoteVideoToggled { enabled }) => {
                let remote = self.get_record(call_id)?.remote.clone();
                let app_event = if *enabled {
                    ApplicationEvent::RemoteVideoEnable
                } else {
                    ApplicationEvent::RemoteVideoDisable
                };
                self.platform.on_event(call_id, &remote, app_event);
            }
            (state, event) => {
                log_unexpected_event(call_id, &state, &CallEvent::Connection(event.clone()));
            }
        }
        Ok(())
    }

    fn handle_message_sent(&mut self, call_id: CallId) -> Result<()> {
        let record = self.get_record_mut(call_id)?;
        record.outbound_in_flight = None;
        self.dispatch_next(call_id);
        Ok(())
    }

    fn handle_message_send_failure(&mut self, call_id: CallId) -> Result<()> {
        let record = self.get_record_mut(call_id)?;
        let failed = record.outbound_in_flight.take();
        let essential = failed.map(|d| d.is_essential()).unwrap_or(false);
        if essential {
            warn!("call_id: {} essential message failed to send", call_id);
            self.terminate_call(call_id, TerminateReason::SignalingFailure);
        } else {
            self.dispatch_next(call_id);
        }
        Ok(())
    }

    fn enter_ringing(&mut self, call_id: CallId) {
        self.set_state(call_id, CallState::Ringing);
        if let Ok(record) = self.get_record(call_id) {
            let (remote, direction) = (record.remote.clone(), record.direction);
            // Outbound: *their* device is the one ringing. Inbound: *ours*
            // is. (S1 places an outbound call and observes `RingingRemote`.)
            let event = match direction {
                CallDirection::Outbound => ApplicationEvent::RingingRemote,
                CallDirection::Inbound => ApplicationEvent::RingingLocal,
            };
            self.platform.on_event(call_id, &remote, event);
        }
    }

    fn replay_buffered_ice(&mut self, call_id: CallId, device: DeviceId) {
        let (connection, to_replay) = {
            let record = match self.calls.get_mut(&call_id) {
                Some(r) => r,
                None => return,
            };
            let connection = match record.connection.clone() {
                Some(c) => c,
                None => return,
            };
            let (matching, rest): (Vec<_>, Vec<_>) = record
                .pending_ice_in
                .drain(..)
                .partition(|(d, _)| *d == device);
            record.pending_ice_in = rest;
            (connection, matching)
        };
        if to_replay.is_empty() {
            return;
        }
        let candidates: Vec<IceCandidate> = to_replay.into_iter().map(|(_, c)| c).collect();
        if let Err(e) = self.platform.add_ice_candidates(call_id, &connection, candidates) {
            warn!("call_id: {} failed to replay buffered ICE candidates: {}", call_id, e);
        }
    }

    fn flush_pending_ice_out(&mut self, call_id: CallId, dest_device: Option<DeviceId>) {
        if let Some(record) = self.calls.get_mut(&call_id) {
            if !record.pending_ice_out.is_empty() {
                let candidates: Vec<IceCandidate> = record.pending_ice_out.drain(..).collect();
                record.enqueue_outbound(OutboundDirective::Ice { dest_device, candidates });
            }
        }
        self.dispatch_next(call_id);
    }

    /// Send at most one outbound directive at a time per call (I3/P2): pop
    /// the queue only when nothing is currently in flight.
    fn dispatch_next(&mut self, call_id: CallId) {
        loop {
            let directive = {
                let record = match self.calls.get_mut(&call_id) {
                    Some(r) => r,
                    None => return,
                };
                if record.outbound_in_flight.is_some() {
                    return;
                }
                match record.outbound_queue.pop_front() {
                    Some(d) => d,
                    None => return,
                }
            };

            {
                let record = self.calls.get_mut(&call_id).unwrap();
                match &directive {
                    OutboundDirective::Offer { .. } => {
                        record.contacted_devices.extend(record.device_list.iter().copied());
                    }
                    OutboundDirective::Answer { dest_device, .. } => {
                        record.contacted_devices.insert(*dest_device);
                    }
                    OutboundDirective::Ice { dest_device: Some(d), .. } => {
                        record.contacted_devices.insert(*d);
                    }
                    _ => {}
                }
            }

            let remote = self.calls.get(&call_id).unwrap().remote.clone();
            let send_result = match &directive {
                OutboundDirective::Offer { sdp } => {
                    self.platform
                        .on_send_offer(call_id, &remote, true, Offer { sdp: sdp.clone() })
                }
                OutboundDirective::Answer { dest_device, sdp } => self.platform.on_send_answer(
                    call_id,
                    &remote,
                    *dest_device,
                    Answer { sdp: sdp.clone() },
                ),
                OutboundDirective::Ice { dest_device, candidates } => {
                    self.platform
                        .on_send_ice_candidates(call_id, &remote, *dest_device, candidates.clone())
                }
                OutboundDirective::Hangup { dest_device } => {
                    self.platform.on_send_hangup(call_id, &remote, *dest_device)
                }
            };

            let assume_sent = self.platform.assume_messages_sent();
            let record = self.calls.get_mut(&call_id).unwrap();
            match send_result {
                Ok(()) => {
                    if assume_sent {
                        // Treated as already acknowledged; loop to send the
                        // next queued directive immediately.
                        continue;
                    }
                    record.outbound_in_flight = Some(directive);
                    return;
                }
                Err(e) => {
                    warn!("call_id: {} send failed before dispatch: {}", call_id, e);
                    if directive.is_essential() {
                        self.terminate_call(call_id, TerminateReason::SignalingFailure);
                    }
                    return;
                }
            }
        }
    }

    fn set_state(&mut self, call_id: CallId, state: CallState) {
        if let Some(record) = self.calls.get_mut(&call_id) {
            debug!("call_id: {} {} -> {}", call_id, record.state, state);
            record.state = state;
        }
    }

    /// Tear a call down, optionally notifying the remote side and always
    /// notifying the local application (unless `reason` is
    /// `TerminateReason::Dropped`), then evict it from the registry.
    fn terminate_call(&mut self, call_id: CallId, reason: TerminateReason) {
        let record = match self.calls.get_mut(&call_id) {
            Some(r) => r,
            None => return,
        };
        if record.is_terminated() {
            return;
        }
        record.state = CallState::Terminated(reason);

        if matches!(
            reason,
            TerminateReason::LocalHangup
                | TerminateReason::ConnectionFailure
                | TerminateReason::Timeout
                | TerminateReason::RemoteGlare
        ) {
            record.outbound_queue.clear();
            // Once a device has been selected (its answer accepted), a
            // hangup need only reach that device; otherwise every device
            // that heard the offer is still owed one (§4.1: "to all
            // previously contacted devices").
            match record.selected_device {
                Some(device) => record.enqueue_outbound(OutboundDirective::Hangup { dest_device: Some(device) }),
                None if !record.contacted_devices.is_empty() => {
                    let mut devices: Vec<DeviceId> = record.contacted_devices.iter().copied().collect();
                    devices.sort_unstable();
                    for device in devices {
                        record.enqueue_outbound(OutboundDirective::Hangup { dest_device: Some(device) });
                    }
                }
                None => record.enqueue_outbound(OutboundDirective::Hangup { dest_device: None }),
            }
        }

        let remote = record.remote.clone();
        if let Some(event) = reason.application_event() {
            self.platform.on_event(call_id, &remote, event);
        }
        self.platform.on_call_concluded(call_id, &remote);

        if self.active_call_id == Some(call_id) {
            self.active_call_id = None;
        }
        self.dispatch_next(call_id);
        // Per I2, a terminated record lingers ("awaiting cleanup") rather
        // than being evicted here: callers still query `call_state` for the
        // terminal reason, and a CallId must never be reused while its
        // record could still be observed.
        info!("call_id: {} terminated: {:?}", call_id, reason);
    }

    fn get_record(&self, call_id: CallId) -> Result<&CallRecord<P>> {
        self.calls.get(&call_id).ok_or(CallError::CallIdNotFound(call_id))
    }

    fn get_record_mut(&mut self, call_id: CallId) -> Result<&mut CallRecord<P>> {
        self.calls
            .get_mut(&call_id)
            .ok_or(CallError::CallIdNotFound(call_id))
    }
}
