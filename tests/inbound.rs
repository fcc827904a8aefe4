//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Tests for inbound calls, driven directly against `CallManager<SimPlatform>`.

mod common;

use std::time::{Duration, SystemTime};

use callcore::core::connection::ConnectionEvent;
use callcore::core::signaling::{IceCandidate, ReceivedOffer};
use callcore::{ApplicationEvent, CallDirection, CallId, CallState, TerminateReason};

use common::{fresh_offer, new_manager, test_init, REMOTE_DEVICE};

/// S2: an inbound offer arrives, the application proceeds and accepts, ICE
/// and media both complete, then the remote hangs up.
#[test]
fn full_inbound_happy_path() {
    test_init();
    let (mut manager, platform) = new_manager();

    let call_id = CallId::from(42);
    manager
        .receive_offer("alice".to_string(), call_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    assert_eq!(manager.active_call_id(), Some(call_id));
    assert_eq!(manager.call_state(call_id), Some(CallState::Starting));

    manager
        .proceed(call_id, "app-context".to_string(), vec![], false)
        .unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Proceeding));
    assert_eq!(platform.sent_for(call_id).len(), 1);
    assert!(matches!(
        &platform.sent_for(call_id)[0],
        callcore::sim::SentDirective::Answer { .. }
    ));
    manager.message_sent(call_id).unwrap();

    manager.connection_event(call_id, ConnectionEvent::IceConnected).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Ringing));
    assert_eq!(
        platform.application_events(call_id),
        vec![ApplicationEvent::RingingLocal]
    );

    manager.accept(call_id).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Accepting));

    manager.on_connect_media(call_id, Some("remote-video-track".to_string())).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Connected));
    assert_eq!(
        platform.application_events(call_id),
        vec![
            ApplicationEvent::RingingLocal,
            ApplicationEvent::ConnectedLocal,
            ApplicationEvent::ConnectedRemote,
        ]
    );
    assert!(platform.events().iter().any(|e| matches!(
        e,
        callcore::sim::RecordedEvent::RemoteVideoTrack { call_id: id, .. } if *id == call_id
    )));

    manager.received_hangup(call_id).unwrap();
    assert_eq!(manager.active_call_id(), None);
    assert_eq!(
        manager.call_state(call_id),
        Some(CallState::Terminated(TerminateReason::RemoteHangup))
    );
}

#[test]
fn on_start_call_reports_inbound_direction() {
    test_init();
    let (mut manager, platform) = new_manager();

    let call_id = CallId::from(7);
    manager
        .receive_offer("alice".to_string(), call_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    let started = platform.events().into_iter().find_map(|e| match e {
        callcore::sim::RecordedEvent::StartCall { call_id: id, direction, .. } if id == call_id => Some(direction),
        _ => None,
    });
    assert_eq!(started, Some(CallDirection::Inbound));
}

/// P4: an offer whose timestamp is already too old to accept is dropped
/// before ever becoming a call, but the application still hears about it.
#[test]
fn stale_offer_is_dropped_with_an_event() {
    test_init();
    let (mut manager, platform) = new_manager();

    let call_id = CallId::from(99);
    let stale = ReceivedOffer {
        sdp: "sdp-offer".to_string(),
        sent_at: SystemTime::now() - Duration::from_secs(3600),
    };
    manager.receive_offer("alice".to_string(), call_id, REMOTE_DEVICE, stale).unwrap();

    assert_eq!(manager.active_call_id(), None);
    assert_eq!(manager.call_state(call_id), None);
    assert_eq!(
        platform.application_events(call_id),
        vec![ApplicationEvent::EndedReceivedOfferExpired]
    );
}

/// An inbound offer that goes stale between `receive_offer` and `proceed`
/// (rather than being stale on arrival) is terminated instead of answered.
#[test]
fn offer_expiring_before_proceed_is_terminated() {
    test_init();
    let (mut manager, platform) = new_manager_with_short_max_age();

    let call_id = CallId::from(11);
    manager
        .receive_offer("alice".to_string(), call_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    std::thread::sleep(Duration::from_millis(100));

    manager
        .proceed(call_id, "app-context".to_string(), vec![], false)
        .unwrap();

    assert_eq!(
        manager.call_state(call_id),
        Some(CallState::Terminated(TerminateReason::ReceivedOfferExpired))
    );
    assert!(platform
        .application_events(call_id)
        .contains(&ApplicationEvent::EndedReceivedOfferExpired));
}

/// P6: ICE candidates that arrive before the connection exists are buffered
/// and handed to the platform, in arrival order, once `proceed()` builds it.
#[test]
fn ice_candidates_received_before_proceed_are_buffered_then_replayed_in_order() {
    test_init();
    let (mut manager, platform) = new_manager();

    let call_id = CallId::from(5);
    manager
        .receive_offer("alice".to_string(), call_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    let first = IceCandidate::new("audio".to_string(), 0, "candidate-1".to_string());
    let second = IceCandidate::new("audio".to_string(), 0, "candidate-2".to_string());
    manager
        .received_ice(call_id, REMOTE_DEVICE, vec![first.clone(), second.clone()])
        .unwrap();

    // No connection yet: nothing handed to the platform, nothing lost.
    assert!(platform.ice_added_for(call_id).is_empty());

    manager
        .proceed(call_id, "app-context".to_string(), vec![], false)
        .unwrap();

    assert_eq!(platform.ice_added_for(call_id), vec![first, second]);
}

fn new_manager_with_short_max_age() -> (callcore::CallManager<callcore::sim::SimPlatform>, callcore::sim::SimPlatform) {
    let mut config = callcore::common::config::Config::default();
    config.max_offer_age = Duration::from_millis(50);
    common::new_manager_with_config(config)
}
