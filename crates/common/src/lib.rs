// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

pub mod address;
pub mod error;
pub mod resolve;

pub mod pb {
    // Suppress clippy on generated code
    #![allow(clippy::all)]
    #![allow(clippy::missing_errors_doc)]
    #![allow(clippy::must_use_candidate)]
    #![allow(clippy::doc_markdown)]

    /// Wire-compatible with `google.protobuf.Empty`
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Empty {}

    pub mod event {
        include!(concat!(env!("OUT_DIR"), "/grpc.EventService.rs"));
    }
}

pub use crate::address::{parse, Address, DialString, Scheme};
pub use crate::error::TransportError;
