// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting client for the medrelay notification relay.
//!
//! ```no_run
//! # async fn demo() -> Result<(), medrelay_client::ClientError> {
//! use std::sync::Arc;
//! use medrelay_client::{ClientConfig, ReconnectingSocket, TungsteniteConnector};
//!
//! let socket = ReconnectingSocket::connect(
//!     "42",
//!     "https://book.example.com",
//!     ClientConfig::default(),
//!     Arc::new(TungsteniteConnector),
//! )?;
//! socket.send_message(&serde_json::json!({ "type": "ack", "id": 7 }));
//! for record in socket.messages().await {
//!     println!("{record:?}");
//! }
//! socket.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod notification;
pub mod socket;
pub mod state;
pub mod test_support;
pub mod url;

pub use config::{ClientConfig, ReconnectPolicy};
pub use connector::{Connection, Connector, TungsteniteConnector};
pub use error::ClientError;
pub use notification::{Notification, Record};
pub use socket::ReconnectingSocket;
pub use state::ConnectionState;
