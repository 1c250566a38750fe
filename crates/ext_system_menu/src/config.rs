//! Declarative menu layouts.
//!
//! Layouts come either from a TOML file listing every module, or as a JSON array of item
//! specs sent by a single module.

use crate::native::NativeMenu;
use crate::registry::{RegistryOptions, SystemMenuRegistry};
use crate::{MenuItemSpec, ModuleHandle, SystemMenuError, SEPARATOR_NAME};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Layout file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MenuLayoutConfig {
    #[serde(default)]
    pub options: RegistryOptions,
    #[serde(default)]
    pub modules: Vec<ModuleLayout>,
}

/// One module's entries, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleLayout {
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItemSpec>,
}

impl MenuLayoutConfig {
    /// Parse and validate a TOML layout
    pub fn from_toml_str(source: &str) -> Result<Self, SystemMenuError> {
        let config: Self =
            toml::from_str(source).map_err(|e| SystemMenuError::config_parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML layout file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SystemMenuError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SystemMenuError::config_io(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loading menu layout from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), SystemMenuError> {
        let mut names = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(SystemMenuError::invalid_config("module name is empty"));
            }
            if !names.insert(module.name.as_str()) {
                return Err(SystemMenuError::invalid_config(format!(
                    "module '{}' is declared twice",
                    module.name
                )));
            }
            validate_items(&module.items)
                .map_err(|e| SystemMenuError::invalid_config(format!("{}: {}", module.name, e)))?;
        }
        Ok(())
    }

    /// Handle assigned to the module at `index`: declaration order, starting at 1
    pub fn module_handle(index: usize) -> ModuleHandle {
        ModuleHandle::from_raw(index as u64 + 1)
    }

    /// Store every module's layout in `registry`.
    ///
    /// Returns the handle assigned to each module name.
    pub fn register_all<M: NativeMenu>(
        &self,
        registry: &mut SystemMenuRegistry<M>,
    ) -> Vec<(ModuleHandle, String)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(index, module)| {
                let handle = Self::module_handle(index);
                registry.set_configuration(handle, module.items.clone());
                (handle, module.name.clone())
            })
            .collect()
    }
}

/// Parse the JSON item array a module sends with its configuration
pub fn parse_items_json(source: &str) -> Result<Vec<MenuItemSpec>, SystemMenuError> {
    let items: Vec<MenuItemSpec> =
        serde_json::from_str(source).map_err(|e| SystemMenuError::config_parse(e.to_string()))?;
    validate_items(&items).map_err(SystemMenuError::invalid_config)?;
    Ok(items)
}

fn validate_items(items: &[MenuItemSpec]) -> Result<(), String> {
    let mut names = HashSet::new();
    for item in items {
        if item.name.trim().is_empty() {
            return Err("item name is empty".to_string());
        }
        if item.name == SEPARATOR_NAME {
            return Err(format!("'{}' is reserved", SEPARATOR_NAME));
        }
        if !names.insert(item.name.as_str()) {
            return Err(format!("item '{}' is declared twice", item.name));
        }
    }
    Ok(())
}
