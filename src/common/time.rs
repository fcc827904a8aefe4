//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Wall-clock helpers used for offer-age checks and logging.

use std::time::{Duration, SystemTime};

/// The duration elapsed between `ts` and now, saturating at zero instead of
/// panicking when `ts` is in the future (clock skew between devices is
/// routine for a value carried over the wire).
pub fn saturating_epoch_time(ts: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(ts)
        .unwrap_or(Duration::from_secs(0))
}
