// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

use std::io;
use thiserror::Error;
use tonic::{Code, Status};

/// Terminal outcomes of parsing and dialing.
///
/// `Io` is what a single connect attempt (or hybrid handshake) fails with.
/// The bounded dialer swallows it and retries, so callers of the transport
/// only ever observe the other three.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    DeadlineExceeded(String),
    #[error("{0}")]
    Unimplemented(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = TransportError> = std::result::Result<T, E>;

impl TransportError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// gRPC status code matching the error kind
    #[must_use]
    pub fn code(&self) -> Code {
        match self {
            Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::DeadlineExceeded(_) => Code::DeadlineExceeded,
            Self::Unimplemented(_) => Code::Unimplemented,
            Self::Io(_) => Code::Unavailable,
        }
    }

    /// Errors that no amount of redialing will fix
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::Unimplemented(_))
    }
}

impl From<TransportError> for Status {
    fn from(err: TransportError) -> Self {
        Status::new(err.code(), err.to_string())
    }
}

/// Conversion back to `io::Error`, for connectors that must speak `std::io`
impl From<TransportError> for io::Error {
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            TransportError::Io(e) => e.kind(),
            TransportError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            TransportError::DeadlineExceeded(_) => io::ErrorKind::TimedOut,
            TransportError::Unimplemented(_) => io::ErrorKind::Unsupported,
        };
        io::Error::new(kind, err)
    }
}
