//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Per-call context: the policy and application state a call is set up
//! with at `proceed()` time.

use crate::core::platform::{IceServer, Platform};

/// Created by the application and handed to `CallManager::proceed`; owned by
/// the call record for the lifetime of the call.
///
/// `ice_servers`/`hide_ip` are meaningful to the core (they shape the
/// `PeerConnectionConfig` built in `core::connection`); everything about
/// actual media — capture devices, outgoing tracks, encoders — lives inside
/// the opaque `app` bag and is never inspected here.
pub struct CallContext<P: Platform> {
    pub ice_servers: Vec<IceServer>,
    pub hide_ip: bool,
    pub app: P::AppCallContext,
}

impl<P: Platform> CallContext<P> {
    pub fn new(ice_servers: Vec<IceServer>, hide_ip: bool, app: P::AppCallContext) -> Self {
        Self {
            ice_servers,
            hide_ip,
            app,
        }
    }
}

impl<P: Platform> Clone for CallContext<P> {
    fn clone(&self) -> Self {
        Self {
            ice_servers: self.ice_servers.clone(),
            hide_ip: self.hide_ip,
            app: self.app.clone(),
        }
    }
}
