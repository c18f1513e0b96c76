//! Tokio driver and typed API over the Wavelink session core.
//!
//! [`Client`] owns a [`wavelink_core::Session`] and runs the tasks that feed
//! it: transport read loops, a periodic tick, and an ordered event delivery
//! loop. Operations return an [`OperationHandle`] immediately; awaiting it
//! yields the [`wavelink_core::OperationOutcome`] once the server answers,
//! the deadline passes, or the session cancels.
//!
//! The transport is a seam: implement [`Connector`] to dial a real server,
//! or use [`MemoryConnector`] to script one in-process.
//!
//! ```no_run
//! # async fn demo() -> Result<(), wavelink_client::ClientError> {
//! use std::sync::Arc;
//! use wavelink_client::{Client, ClientConfig, MemoryConnector, NullSink};
//! use wavelink_proto::types::{PublishOptions, SubscribeOptions};
//!
//! let (connector, _server) = MemoryConnector::new(32);
//! let client = Client::new(ClientConfig::new("alice"), connector, Arc::new(NullSink));
//!
//! let login = client.login("token").await?;
//! login.outcome().await?;
//!
//! client.subscribe("lobby", &SubscribeOptions::messages_and_presence()).await?;
//! client.publish("lobby", b"hello", &PublishOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod history;
mod lock;
mod payloads;
mod presence;
mod sink;
mod storage;
mod stream;
mod transport;

pub use client::{Client, OperationHandle};
pub use config::{ClientConfig, DEFAULT_EVENT_QUEUE_DEPTH, DEFAULT_TICK_INTERVAL};
pub use error::ClientError;
pub use history::History;
pub use lock::Lock;
pub use presence::Presence;
pub use sink::{EventSink, NullSink};
pub use storage::Storage;
pub use stream::StreamChannel;
pub use transport::{Connector, LinkHandle, MemoryConnector, MemoryLink, TransportError, TransportSignal};
