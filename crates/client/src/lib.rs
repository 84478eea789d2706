// SPDX-FileCopyrightText: 2025-2026 TII (SSRC) and the Ghaf contributors
// SPDX-License-Identifier: Apache-2.0

pub mod connection;
pub mod dialer;
pub mod endpoint;
pub mod event;
pub mod handshake;
pub mod transport;
pub mod vsock;

pub use crate::connection::Connection;
pub use crate::event::EventClient;
pub use crate::transport::dial;
