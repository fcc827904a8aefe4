//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Timing budgets that govern call setup, offer freshness, and reconnects.
//!
//! Everything here has a sensible default; applications that embed the core
//! override individual fields on a `Config::default()` rather than
//! recompiling constants.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// How long an outbound call may sit in `Starting`/`Proceeding`/`Ringing`
    /// before timing out, absent any answer.
    pub setup_timeout: Duration,

    /// How old a received offer's timestamp may be before `receive_offer`
    /// rejects it outright as `TerminateReason::ReceivedOfferExpired`.
    pub max_offer_age: Duration,

    /// How long a `Connected` call may remain in `Reconnecting` before it is
    /// torn down as `TerminateReason::ConnectionFailure`.
    pub reconnect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            setup_timeout: Duration::from_secs(60),
            max_offer_age: Duration::from_secs(60),
            reconnect_timeout: Duration::from_secs(30),
        }
    }
}
