//! `vlink config` – show where the configuration lives and what is in effect.

use anyhow::Result;
use std::path::Path;
use vlink_core::config::{self, VlinkConfig};

pub fn run_config(explicit: Option<&Path>, cfg: &VlinkConfig) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
