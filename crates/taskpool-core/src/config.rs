use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use crate::domain::Partition;

pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 13000));

/// Where to listen and where each partition's table lives.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub partitions: BTreeMap<Partition, PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LISTEN_ADDR, ".")
    }
}

impl ServerConfig {
    /// All four partitions under `data_dir`, using the default file names.
    pub fn new(listen_addr: SocketAddr, data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let partitions = Partition::ALL
            .into_iter()
            .map(|partition| (partition, data_dir.join(Self::default_file_name(partition))))
            .collect();
        Self {
            listen_addr,
            partitions,
        }
    }

    /// `Servico_A.csv` .. `Servico_D.csv`
    pub fn default_file_name(partition: Partition) -> String {
        format!("Servico_{partition}.csv")
    }

    pub fn with_partition_path(mut self, partition: Partition, path: impl Into<PathBuf>) -> Self {
        self.partitions.insert(partition, path.into());
        self
    }

    pub fn partition_path(&self, partition: Partition) -> Option<&Path> {
        self.partitions.get(&partition).map(PathBuf::as_path)
    }
}
