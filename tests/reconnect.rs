//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Tests for reconnect handling and timeout bookkeeping (`CallManager::tick`).

mod common;

use std::time::Duration;

use callcore::core::connection::ConnectionEvent;
use callcore::{ApplicationEvent, CallState, TerminateReason};

use common::{new_manager, new_manager_with_config, test_init, REMOTE_DEVICE};

fn connected_outbound_call(
    manager: &mut callcore::CallManager<callcore::sim::SimPlatform>,
) -> callcore::CallId {
    let call_id = manager.call("alice".to_string(), vec![REMOTE_DEVICE]).unwrap();
    manager
        .proceed(call_id, "app-context".to_string(), vec![], false)
        .unwrap();
    manager.message_sent(call_id).unwrap();
    manager.received_answer(call_id, REMOTE_DEVICE, "sdp-answer".to_string()).unwrap();
    manager.connection_event(call_id, ConnectionEvent::IceConnected).unwrap();
    manager.on_connect_media(call_id, None).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Connected));
    call_id
}

/// A brief ICE hiccup on a `Connected` call moves it to `Reconnecting` and
/// back without ever terminating it.
#[test]
fn ice_disconnect_then_reconnect_recovers() {
    test_init();
    let (mut manager, platform) = new_manager();
    let call_id = connected_outbound_call(&mut manager);

    manager.connection_event(call_id, ConnectionEvent::IceDisconnected).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Reconnecting));
    assert!(platform
        .application_events(call_id)
        .contains(&ApplicationEvent::Reconnecting));

    manager.connection_event(call_id, ConnectionEvent::IceConnected).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Connected));
    assert!(platform
        .application_events(call_id)
        .contains(&ApplicationEvent::Reconnected));
}

/// If `Reconnecting` outlasts the configured reconnect budget, `tick()`
/// tears the call down as `ConnectionFailure`.
#[test]
fn reconnect_budget_exhaustion_terminates_the_call() {
    test_init();
    let mut config = callcore::common::config::Config::default();
    config.reconnect_timeout = Duration::from_millis(20);
    let (mut manager, platform) = new_manager_with_config(config);

    let call_id = connected_outbound_call(&mut manager);
    manager.connection_event(call_id, ConnectionEvent::IceDisconnected).unwrap();
    assert_eq!(manager.call_state(call_id), Some(CallState::Reconnecting));

    std::thread::sleep(Duration::from_millis(60));
    manager.tick();

    assert_eq!(
        manager.call_state(call_id),
        Some(CallState::Terminated(TerminateReason::ConnectionFailure))
    );
    assert!(platform
        .application_events(call_id)
        .contains(&ApplicationEvent::EndedConnectionFailure));
    assert!(matches!(
        platform.sent_for(call_id).last(),
        Some(callcore::sim::SentDirective::Hangup { .. })
    ));
}

/// A fatal ICE failure terminates the call immediately, without waiting for
/// the reconnect budget at all.
#[test]
fn ice_failed_terminates_immediately() {
    test_init();
    let (mut manager, platform) = new_manager();
    let call_id = connected_outbound_call(&mut manager);

    manager.connection_event(call_id, ConnectionEvent::IceFailed).unwrap();

    assert_eq!(
        manager.call_state(call_id),
        Some(CallState::Terminated(TerminateReason::ConnectionFailure))
    );
    assert!(platform
        .application_events(call_id)
        .contains(&ApplicationEvent::EndedConnectionFailure));
}

/// A call that never makes it out of setup within `setup_timeout` is torn
/// down by `tick()`, independent of reconnect bookkeeping.
#[test]
fn setup_timeout_terminates_a_stalled_call() {
    test_init();
    let mut config = callcore::common::config::Config::default();
    config.setup_timeout = Duration::from_millis(20);
    let (mut manager, platform) = new_manager_with_config(config);

    let call_id = manager.call("alice".to_string(), vec![REMOTE_DEVICE]).unwrap();
    std::thread::sleep(Duration::from_millis(60));
    manager.tick();

    assert_eq!(
        manager.call_state(call_id),
        Some(CallState::Terminated(TerminateReason::Timeout))
    );
    assert!(platform
        .application_events(call_id)
        .contains(&ApplicationEvent::EndedTimeout));
}

/// A `Connected` call is exempt from the setup timeout no matter how long
/// it has been alive.
#[test]
fn connected_calls_are_exempt_from_setup_timeout() {
    test_init();
    let mut config = callcore::common::config::Config::default();
    config.setup_timeout = Duration::from_millis(20);
    let (mut manager, _platform) = new_manager_with_config(config);

    let call_id = connected_outbound_call(&mut manager);
    std::thread::sleep(Duration::from_millis(60));
    manager.tick();

    assert_eq!(manager.call_state(call_id), Some(CallState::Connected));
}
