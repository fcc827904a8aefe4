//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! `CallManagerHandle`: the thread-hopping façade applications actually embed.
//!
//! `CallManager<P>` itself is synchronous and single-threaded by
//! construction (see `core::call_manager`), which is exactly what makes it
//! easy to drive directly in tests. An embedding application, though, calls
//! in from several different threads (UI, transport, WebRTC callbacks), and
//! every one of those calls must be serialized onto one logical "event
//! thread" (§5). Rather than assert that requirement at runtime with a
//! mutex and a thread-id check, `CallManagerHandle` makes off-thread access
//! structurally impossible: the only way to reach a `CallManager` is to send
//! a job across this channel, and the one thread draining it is the only
//! place a `CallManager` ever
//! exists.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use log::warn;

use crate::common::config::Config;
use crate::common::{CallId, DeviceId};
use crate::core::call_manager::CallManager;
use crate::core::connection::ConnectionEvent;
use crate::core::platform::{IceServer, Platform};
use crate::core::signaling::{IceCandidate, ReceivedOffer};
use crate::error::{CallError, Result};

/// A unit of work dispatched onto the event thread. Boxed so the channel
/// can carry heterogeneous closures regardless of their captured state.
type Job<P> = Box<dyn FnOnce(&mut CallManager<P>) + Send>;

/// How often `CallManagerHandle` asks the event thread to run `tick()`
/// (setup/reconnect timeout bookkeeping) when the application doesn't drive
/// it itself via `tick()`.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A cheap-to-clone handle to a `CallManager` running on a dedicated
/// background thread. Every method sends a job and blocks on its reply,
/// which is fine: the event thread never does blocking I/O itself, so the
/// round trip is as fast as one registry lookup.
#[derive(Clone)]
pub struct CallManagerHandle<P: Platform + 'static> {
    tx: Sender<Job<P>>,
}

impl<P: Platform + Send + 'static> CallManagerHandle<P> {
    /// Spawn the event thread and start it draining jobs (and ticking the
    /// manager on `DEFAULT_TICK_INTERVAL`) until every clone of this handle
    /// is dropped.
    pub fn new(platform: P, config: Config) -> Self {
        let (tx, rx): (Sender<Job<P>>, Receiver<Job<P>>) = mpsc::channel();
        thread::Builder::new()
            .name("call-manager-event-thread".to_string())
            .spawn(move || Self::run(platform, config, rx))
            .expect("failed to spawn call manager event thread");
        Self { tx }
    }

    fn run(platform: P, config: Config, rx: Receiver<Job<P>>) {
        let mut manager = CallManager::new(platform, config);
        loop {
            match rx.recv_timeout(DEFAULT_TICK_INTERVAL) {
                Ok(job) => job(&mut manager),
                Err(RecvTimeoutError::Timeout) => manager.tick(),
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    /// Run `f` on the event thread and block until it completes, returning
    /// whatever it returns. The only panic path is the event thread itself
    /// having died, which `CallError::WorkerChannelClosed` reports instead.
    fn call<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CallManager<P>) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        let job: Job<P> = Box::new(move |manager| {
            let result = f(manager);
            if reply_tx.send(result).is_err() {
                warn!("call manager event thread: reply receiver already gone");
            }
        });
        self.tx.send(job).map_err(|_| CallError::WorkerChannelClosed)?;
        reply_rx.recv().map_err(|_| CallError::WorkerChannelClosed)
    }

    pub fn place_call(&self, remote: P::AppRemotePeer, device_list: Vec<DeviceId>) -> Result<CallId> {
        self.call(move |m| m.call(remote, device_list))?
    }

    pub fn receive_offer(
        &self,
        remote: P::AppRemotePeer,
        call_id: CallId,
        src_device: DeviceId,
        received: ReceivedOffer,
    ) -> Result<()> {
        self.call(move |m| m.receive_offer(remote, call_id, src_device, received))?
    }

    pub fn proceed(
        &self,
        call_id: CallId,
        app_context: P::AppCallContext,
        ice_servers: Vec<IceServer>,
        hide_ip: bool,
    ) -> Result<()> {
        self.call(move |m| m.proceed(call_id, app_context, ice_servers, hide_ip))?
    }

    pub fn accept(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.accept(call_id))?
    }

    pub fn hangup(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.hangup(call_id))?
    }

    pub fn drop_call(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.drop_call(call_id))?
    }

    pub fn reset(&self) -> Result<()> {
        self.call(|m| m.reset())
    }

    pub fn message_sent(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.message_sent(call_id))?
    }

    pub fn message_send_failure(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.message_send_failure(call_id))?
    }

    pub fn received_answer(&self, call_id: CallId, src_device: DeviceId, sdp: String) -> Result<()> {
        self.call(move |m| m.received_answer(call_id, src_device, sdp))?
    }

    pub fn received_ice(&self, call_id: CallId, src_device: DeviceId, candidates: Vec<IceCandidate>) -> Result<()> {
        self.call(move |m| m.received_ice(call_id, src_device, candidates))?
    }

    pub fn received_hangup(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.received_hangup(call_id))?
    }

    pub fn received_busy(&self, call_id: CallId) -> Result<()> {
        self.call(move |m| m.received_busy(call_id))?
    }

    pub fn connection_event(&self, call_id: CallId, event: ConnectionEvent) -> Result<()> {
        self.call(move |m| m.connection_event(call_id, event))?
    }

    pub fn on_connect_media(&self, call_id: CallId, remote_video_track: Option<P::AppVideoTrack>) -> Result<()> {
        self.call(move |m| m.on_connect_media(call_id, remote_video_track))?
    }

    pub fn set_local_audio_enabled(&self, enabled: bool) -> Result<()> {
        self.call(move |m| m.set_local_audio_enabled(enabled))?
    }

    pub fn set_local_video_enabled(&self, enabled: bool, call_id: CallId) -> Result<()> {
        self.call(move |m| m.set_local_video_enabled(enabled, call_id))?
    }

    pub fn set_camera_source(&self, use_front_camera: bool) -> Result<()> {
        self.call(move |m| m.set_camera_source(use_front_camera))?
    }

    /// Run setup/reconnect timeout bookkeeping immediately instead of
    /// waiting for the next `DEFAULT_TICK_INTERVAL` wakeup. Mostly useful
    /// in tests that want deterministic timing.
    pub fn tick(&self) -> Result<()> {
        self.call(|m| m.tick())
    }

    pub fn active_call_id(&self) -> Result<Option<CallId>> {
        self.call(|m| m.active_call_id())
    }
}

impl<P: Platform + 'static> std::fmt::Debug for CallManagerHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallManagerHandle").finish_non_exhaustive()
    }
}
