use crate::error::{CorvioError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A backend storage device: one disk on one storage node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub ip: String,
    pub port: u16,
    pub device: String,
}

impl Device {
    pub fn new(ip: impl Into<String>, port: u16, device: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port,
            device: device.into(),
        }
    }
}

/// Placement oracle mapping a logical path onto a replica set.
///
/// A ring snapshot is built once and never mutated; `partition` must be a
/// pure function of the path, and the order of `nodes` is significant
/// because replica index i on one ring is paired with replica index i on
/// another when placement hints are injected.
pub trait Ring: Send + Sync {
    fn partition(&self, account: &str, container: &str, object: &str) -> u64;

    /// The ordered primary replica set for a partition. Never empty for a
    /// well-formed ring.
    fn nodes(&self, partition: u64) -> Vec<Device>;
}

/// Fixed-device ring for embedding and tests.
///
/// Partitions are derived from the leading bytes of a SHA-256 over the
/// joined path; replicas are consecutive devices starting at
/// `partition % device_count`.
#[derive(Debug, Clone)]
pub struct StaticRing {
    devices: Vec<Device>,
    partition_count: u64,
    replica_count: usize,
}

impl StaticRing {
    pub fn new(devices: Vec<Device>, partition_count: u64, replica_count: usize) -> Result<Self> {
        if devices.is_empty() {
            return Err(CorvioError::Config(
                "ring requires at least one device".to_string(),
            ));
        }
        if partition_count == 0 {
            return Err(CorvioError::Config(
                "ring partition count cannot be zero".to_string(),
            ));
        }
        if replica_count == 0 {
            return Err(CorvioError::Config(
                "ring replica count cannot be zero".to_string(),
            ));
        }

        Ok(Self {
            devices,
            partition_count,
            replica_count,
        })
    }

    pub fn replica_count(&self) -> usize {
        self.replica_count.min(self.devices.len())
    }
}

impl Ring for StaticRing {
    fn partition(&self, account: &str, container: &str, object: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(account.as_bytes());
        hasher.update(b"/");
        hasher.update(container.as_bytes());
        hasher.update(b"/");
        hasher.update(object.as_bytes());
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(prefix) % self.partition_count
    }

    fn nodes(&self, partition: u64) -> Vec<Device> {
        let start = (partition % self.devices.len() as u64) as usize;
        (0..self.replica_count())
            .map(|i| self.devices[(start + i) % self.devices.len()].clone())
            .collect()
    }
}
