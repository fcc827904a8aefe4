//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Tests for busy/glare arbitration (§4.4).

mod common;

use callcore::{ApplicationEvent, CallId, CallState, TerminateReason};

use common::{fresh_offer, new_manager, test_init, REMOTE_DEVICE};

/// P5: an inbound offer from a *different* remote while a call is active is
/// just busy; the active call is left completely untouched.
#[test]
fn offer_from_different_remote_is_busy() {
    test_init();
    let (mut manager, platform) = new_manager();

    let active_id = manager.call("alice".to_string(), vec![REMOTE_DEVICE]).unwrap();

    let incoming_id = CallId::from(123);
    manager
        .receive_offer("bob".to_string(), incoming_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    assert_eq!(manager.active_call_id(), Some(active_id));
    assert_eq!(manager.call_state(active_id), Some(CallState::Starting));
    assert_eq!(manager.call_state(incoming_id), None);

    assert!(matches!(
        platform.sent_for(incoming_id).as_slice(),
        [callcore::sim::SentDirective::Busy { .. }]
    ));
    assert_eq!(
        platform.application_events(incoming_id),
        vec![ApplicationEvent::EndedReceivedOfferWhileActive]
    );
}

/// §4.4: an offer from the *same* remote as an active outbound call, while
/// that call hasn't connected yet, is true glare. The numerically larger
/// `CallId` wins regardless of which side placed it first.
#[test]
fn glare_incoming_offer_with_larger_call_id_wins() {
    test_init();
    let (mut manager, platform) = new_manager();

    let active_id = manager.call("alice".to_string(), vec![REMOTE_DEVICE]).unwrap();

    // A `CallId` built from `u64::MAX` beats any call id this manager could
    // plausibly have generated for the active call.
    let incoming_id = CallId::from(u64::MAX);
    manager
        .receive_offer("alice".to_string(), incoming_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    assert_eq!(
        manager.call_state(active_id),
        Some(CallState::Terminated(TerminateReason::RemoteGlare))
    );
    assert!(platform
        .application_events(active_id)
        .contains(&ApplicationEvent::EndedRemoteGlare));
    assert!(matches!(
        platform.sent_for(active_id).last(),
        Some(callcore::sim::SentDirective::Hangup { .. })
    ));

    // The winning offer is surfaced exactly like a fresh inbound call.
    assert_eq!(manager.active_call_id(), Some(incoming_id));
    assert_eq!(manager.call_state(incoming_id), Some(CallState::Starting));
}

/// The mirror image: the local, already-active outbound call keeps winning
/// over an incoming offer with a numerically smaller `CallId`.
#[test]
fn glare_existing_call_with_larger_call_id_wins() {
    test_init();
    let (mut manager, platform) = new_manager();

    let active_id = manager.call("alice".to_string(), vec![REMOTE_DEVICE]).unwrap();

    let incoming_id = CallId::from(0);
    manager
        .receive_offer("alice".to_string(), incoming_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    // The active call survives untouched.
    assert_eq!(manager.active_call_id(), Some(active_id));
    assert_eq!(manager.call_state(active_id), Some(CallState::Starting));

    // The losing offer never became a call at all, and loses as glare, not
    // as a busy rejection: no busy is sent for it.
    assert_eq!(manager.call_state(incoming_id), None);
    assert!(platform.sent_for(incoming_id).is_empty());
    assert_eq!(
        platform.application_events(incoming_id),
        vec![ApplicationEvent::EndedRemoteGlare]
    );
}

/// Once an outbound call has already reached `Connected`, a later offer
/// from the same remote is busy, not glare (glare only applies pre-connect).
#[test]
fn offer_from_same_remote_after_connected_is_busy_not_glare() {
    test_init();
    let (mut manager, platform) = new_manager();

    let active_id = manager.call("alice".to_string(), vec![REMOTE_DEVICE]).unwrap();
    manager
        .proceed(active_id, "app-context".to_string(), vec![], false)
        .unwrap();
    manager.message_sent(active_id).unwrap();
    manager.received_answer(active_id, REMOTE_DEVICE, "sdp-answer".to_string()).unwrap();
    manager
        .connection_event(active_id, callcore::core::connection::ConnectionEvent::IceConnected)
        .unwrap();
    manager.on_connect_media(active_id, None).unwrap();
    assert_eq!(manager.call_state(active_id), Some(CallState::Connected));

    let incoming_id = CallId::from(u64::MAX);
    manager
        .receive_offer("alice".to_string(), incoming_id, REMOTE_DEVICE, fresh_offer("sdp-offer"))
        .unwrap();

    assert_eq!(manager.call_state(active_id), Some(CallState::Connected));
    assert_eq!(manager.call_state(incoming_id), None);
    assert!(matches!(
        platform.sent_for(incoming_id).as_slice(),
        [callcore::sim::SentDirective::Busy { .. }]
    ));
}
