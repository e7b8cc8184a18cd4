//! cloud-init-sysconfig library
//!
//! Renders cloud-init network state into RHEL-family sysconfig files:
//! `ifcfg-*`, `route-*` / `route6-*`, resolv.conf and persistent net rules.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`#![forbid(unsafe_code)]`)
//! - **Render, then write**: files are only written once the whole set
//!   rendered without error
//! - **Deterministic output**: keys and files are emitted in sorted order

pub mod config;
pub mod network;

mod error;

pub use config::{RendererConfig, SysconfigPaths, load_config};
pub use error::SysconfigError;
pub use network::render::{RenderedFile, Renderer, SysconfigRenderer, apply_network_config};
pub use network::v1::parse_network_state;
pub use network::{Interface, InterfaceFilter, InterfaceType, NetworkState};
