//
// Copyright (C) 2019, 2020 Signal Messenger, LLC.
// All rights reserved.
//
// SPDX-License-Identifier: GPL-3.0-only
//

//! Crate-wide error type.

use thiserror::Error;

use crate::common::CallId;

#[derive(Error, Debug)]
pub enum CallError {
    #[error("call {0} not found")]
    CallIdNotFound(CallId),

    #[error("no active call")]
    NoActiveCall,

    #[error("call {0} is not in a state that supports this operation: {1}")]
    InvalidState(CallId, String),

    #[error("call {0}: received offer is too old to accept")]
    Expired(CallId),

    #[error("call {0}: no connection exists yet")]
    ConnectionNotFound(CallId),

    #[error("call {0}: essential signaling message failed to send")]
    SignalingFailure(CallId),

    #[error("call {0}: peer connection failed")]
    ConnectionFailure(CallId),

    #[error("call {0}: internal failure: {1}")]
    InternalFailure(CallId, String),

    #[error("worker thread is no longer running")]
    WorkerChannelClosed,
}

pub type Result<T> = std::result::Result<T, CallError>;
