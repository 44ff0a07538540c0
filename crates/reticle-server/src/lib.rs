// SPDX-License-Identifier: Apache-2.0
//! reticle-server: the `reticled` JSON-RPC service over a layout session.
//!
//! [`net`] owns the TCP listener and line framing; [`service`] owns session
//! state and method dispatch. The split keeps dispatch synchronous and
//! socket-free, so the whole method table is testable without a listener.

/// Listener, line framing, single-client arbitration.
pub mod net;
/// Session state and method dispatch.
pub mod service;

pub use net::{Server, ServerConfig};
pub use service::Session;
