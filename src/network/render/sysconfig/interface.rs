//! Per-interface ifcfg file

use super::route::RouteTable;
use super::store::{KeyValueStore, Value};
use crate::SysconfigError;
use crate::config::paths;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Interface kind, mirrored into the `TYPE` key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterfaceKind {
    #[default]
    Ethernet,
    Bond,
    Bridge,
}

impl InterfaceKind {
    /// Value written to `TYPE=`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ethernet => "Ethernet",
            Self::Bond => "Bond",
            Self::Bridge => "Bridge",
        }
    }
}

impl FromStr for InterfaceKind {
    type Err = SysconfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ethernet" => Ok(Self::Ethernet),
            "bond" => Ok(Self::Bond),
            "bridge" => Ok(Self::Bridge),
            other => Err(SysconfigError::InvalidArgument(format!(
                "Unknown interface kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ethernet => f.write_str("ethernet"),
            Self::Bond => f.write_str("bond"),
            Self::Bridge => f.write_str("bridge"),
        }
    }
}

/// One ifcfg-<name> file plus its alias children and route table
///
/// `DEVICE` always mirrors the current name and `TYPE` the current kind.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceConfig {
    store: KeyValueStore,
    name: String,
    scripts_dir: PathBuf,
    kind: InterfaceKind,
    children: Vec<InterfaceConfig>,
    routes: RouteTable,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, scripts_dir: impl AsRef<Path>) -> Self {
        Self::with_kind(name, scripts_dir, InterfaceKind::Ethernet)
    }

    pub fn with_kind(
        name: impl Into<String>,
        scripts_dir: impl AsRef<Path>,
        kind: InterfaceKind,
    ) -> Self {
        let name = name.into();
        let scripts_dir = scripts_dir.as_ref().to_path_buf();
        let mut cfg = Self {
            store: KeyValueStore::new(),
            routes: RouteTable::new(name.clone(), &scripts_dir),
            name: String::new(),
            scripts_dir,
            kind,
            children: Vec::new(),
        };
        cfg.set_name(name);
        cfg.set_kind(kind);
        cfg
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.store.set("DEVICE", self.name.clone());
    }

    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: InterfaceKind) {
        self.kind = kind;
        self.store.set("TYPE", kind.label());
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.store.set(key, value);
    }

    pub fn get(&self, key: &str) -> Result<&Value, SysconfigError> {
        self.store.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn remove(&mut self, key: &str) {
        self.store.remove(key);
    }

    pub fn store(&self) -> &KeyValueStore {
        &self.store
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn children(&self) -> &[InterfaceConfig] {
        &self.children
    }

    pub fn add_child(&mut self, child: InterfaceConfig) {
        self.children.push(child);
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut RouteTable {
        &mut self.routes
    }

    /// Apply `f` to this config and then to each existing child
    pub fn apply_with_children(&mut self, mut f: impl FnMut(&mut InterfaceConfig)) {
        f(self);
        for child in &mut self.children {
            f(child);
        }
    }

    pub fn path(&self) -> PathBuf {
        paths::ifcfg_path(&self.scripts_dir, &self.name)
    }

    pub fn serialize(&self) -> String {
        self.store.serialize()
    }

    /// Copy for speculative mutation. Top-level keys are always copied into
    /// fresh storage; children and routes only when asked, otherwise the
    /// copy starts with none and an empty route table.
    pub fn copy(&self, include_children: bool, include_routes: bool) -> Self {
        let mut copy = Self::with_kind(self.name.clone(), &self.scripts_dir, self.kind);
        copy.store = self.store.clone();
        if include_children {
            copy.children = self.children.clone();
        }
        if include_routes {
            copy.routes = self.routes.clone();
        }
        copy
    }
}
