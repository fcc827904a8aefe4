//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Shared helpers for the integration tests.

use std::sync::Once;
use std::time::SystemTime;

use callcore::common::config::Config;
use callcore::core::signaling::ReceivedOffer;
use callcore::sim::SimPlatform;
use callcore::{CallManager, DeviceId};

static INIT: Once = Once::new();

pub fn test_init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A fresh manager/platform pair, wired together, ready to drive directly.
pub fn new_manager() -> (CallManager<SimPlatform>, SimPlatform) {
    let platform = SimPlatform::new();
    let manager = CallManager::new(platform.clone(), Config::default());
    (manager, platform)
}

pub fn new_manager_with_config(config: Config) -> (CallManager<SimPlatform>, SimPlatform) {
    let platform = SimPlatform::new();
    let manager = CallManager::new(platform.clone(), config);
    (manager, platform)
}

/// A `ReceivedOffer` that is fresh as of now, for tests that don't care about
/// the staleness check.
pub fn fresh_offer(sdp: &str) -> ReceivedOffer {
    ReceivedOffer {
        sdp: sdp.to_string(),
        sent_at: SystemTime::now(),
    }
}

pub const REMOTE_DEVICE: DeviceId = 1;
