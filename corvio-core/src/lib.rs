//! Corvio Core - request-dispatch core for a replicated object storage proxy
//!
//! Routes account/container/object requests to backend storage nodes using:
//! - Read-only consistent-hash rings for replica placement
//! - Majority quorum for mutations, staggered first-success for reads
//! - A lock-step body tee that streams one client PUT to every replica
//! - Cross-tier placement hints so backends can update parent listings

pub mod account;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod proxy;
pub mod query;
pub mod ring;

pub use account::{AccountClient, ContainerRecord, ObjectRecord};
pub use config::ClientConfig;
pub use dispatch::{first_response, quorum_response};
pub use error::{CorvioError, Result};
pub use fanout::{body_pipe, copy_to_pipes, PipeWriter};
pub use proxy::{DirectClient, ReplicaHead};
pub use query::{backend_path, escape_path, ListingOptions};
pub use ring::{Device, Ring, StaticRing};
