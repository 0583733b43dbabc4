// Configuration loading for all three roles (router, storage node, client).
//
// File defaults are layered under environment-variable overrides via the
// `config` crate, so deployments can override a single field (say, a
// container's bound port) without editing the YAML file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, StorageNodeError};
use crate::types::NodeAddress;

/// Router config (YAML): `lb_host`, `lb_port`, `vnodes`, `hash_random`, `n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub lb_host: String,
    pub lb_port: u16,
    pub vnodes: u32,
    #[serde(default)]
    pub hash_random: bool,
    /// Required when `hash_random` is true — see DESIGN.md's resolution of
    /// the open question around `hashRandom` desyncing router and node
    /// rings across restarts.
    #[serde(default)]
    pub hash_seed: Option<u64>,
    pub n: usize,
    /// Logical `"host:port"` → deployed `"host:port"` rewrite, applied once
    /// when routing tables are pushed to nodes and once when addresses are
    /// embedded in preference lists forwarded with RPCs.
    #[serde(default)]
    pub address_map: HashMap<String, String>,
}

impl RouterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("KV_ROUTER"))
            .build()?;
        let cfg: RouterConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.vnodes == 0 {
            return Err(StorageNodeError::Configuration(
                "vnodes must be >= 1".to_string(),
            ));
        }
        if self.hash_random && self.hash_seed.is_none() {
            return Err(StorageNodeError::Configuration(
                "hash_random requires an explicit hash_seed so router and node rings stay in sync across restarts"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn lb_address(&self) -> NodeAddress {
        NodeAddress::new(self.lb_host.clone(), self.lb_port)
    }
}

/// Pure `(host, port) -> (host, port)` rewrite, applied to logical addresses
/// before they are shared with nodes or embedded in preference lists.
#[derive(Debug, Clone, Default)]
pub struct AddressTranslator {
    map: HashMap<String, String>,
}

impl AddressTranslator {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn translate(&self, addr: &NodeAddress) -> NodeAddress {
        match self.map.get(&addr.to_string()) {
            Some(rewritten) => rewritten.parse().unwrap_or_else(|_| addr.clone()),
            None => addr.clone(),
        }
    }

    pub fn translate_list(&self, addrs: &[NodeAddress]) -> Vec<NodeAddress> {
        addrs.iter().map(|a| self.translate(a)).collect()
    }
}

/// Storage node config: static `N=3, W=2, R=2` in the canonical deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default = "default_w")]
    pub w: usize,
    #[serde(default = "default_r")]
    pub r: usize,
    #[serde(default = "default_backup_path")]
    pub backup_path: String,
    #[serde(default = "default_handoff_interval")]
    pub handoff_interval_secs: u64,
}

fn default_n() -> usize {
    3
}
fn default_w() -> usize {
    2
}
fn default_r() -> usize {
    2
}
fn default_backup_path() -> String {
    "kv_store_backup.json".to_string()
}
fn default_handoff_interval() -> u64 {
    10
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("KV_NODE"))
            .build()?;
        let cfg: NodeConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.w + self.r <= self.n {
            return Err(StorageNodeError::Configuration(format!(
                "W + R must exceed N for quorum overlap (N={}, W={}, R={})",
                self.n, self.w, self.r
            )));
        }
        Ok(())
    }

    pub fn address(&self) -> NodeAddress {
        NodeAddress::new(self.host.clone(), self.port)
    }
}

/// Client config: `lb_host`, `lb_port`, `server_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub lb_host: String,
    pub lb_port: u16,
    pub server_list: Vec<String>,
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn lb_address(&self) -> NodeAddress {
        NodeAddress::new(self.lb_host.clone(), self.lb_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_config_rejects_non_overlapping_quorum() {
        let cfg = NodeConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            n: 3,
            w: 1,
            r: 1,
            backup_path: "x.json".to_string(),
            handoff_interval_secs: 10,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn address_translator_rewrites_known_entries_only() {
        let mut map = HashMap::new();
        map.insert("localhost:9001".to_string(), "172.16.238.11:9001".to_string());
        let translator = AddressTranslator::new(map);

        let translated = translator.translate(&NodeAddress::new("localhost", 9001));
        assert_eq!(translated, NodeAddress::new("172.16.238.11", 9001));

        let untouched = translator.translate(&NodeAddress::new("localhost", 9002));
        assert_eq!(untouched, NodeAddress::new("localhost", 9002));
    }
}
