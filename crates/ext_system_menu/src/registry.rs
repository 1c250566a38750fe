//! The system menu customization registry.
//!
//! Three tables are kept in sync: the configuration of every module, the modules already
//! materialized into each window, and the owner of every generated menu id. Native menu
//! failures never surface to callers; they are logged and the operation degrades to a no-op.

use crate::native::NativeMenu;
use crate::{
    IdMapping, ItemId, MenuCommand, MenuItemSpec, ModuleHandle, WindowHandle, SEPARATOR_NAME,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

/// Seed of the menu id generator. The first id handed out is one above it.
pub const ITEM_ID_BASE: u32 = 0x7077_7479;

static LAST_ITEM_ID: AtomicU32 = AtomicU32::new(ITEM_ID_BASE);

/// Mint a process-wide unique menu entry id
fn next_item_id() -> ItemId {
    ItemId::from_raw(LAST_ITEM_ID.fetch_add(1, Ordering::Relaxed).wrapping_add(1))
}

/// What happens to a module's existing native entries when its configuration is replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconfigurePolicy {
    /// Only the processed markers are cleared. Old entries stay in each window until the
    /// module is reset or the window is customized for the module again.
    #[default]
    Deferred,
    /// Old entries are deleted from every window immediately.
    Eager,
}

/// Registry tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOptions {
    #[serde(default)]
    pub reconfigure: ReconfigurePolicy,
}

/// Coordinates every module's custom entries across all windows of the process.
///
/// Callers must use the registry from the thread that runs the window message loop, or go
/// through [`crate::SharedSystemMenuRegistry`].
pub struct SystemMenuRegistry<M> {
    menu: M,
    options: RegistryOptions,
    configurations: HashMap<ModuleHandle, Vec<MenuItemSpec>>,
    processed: HashMap<WindowHandle, Vec<ModuleHandle>>,
    id_mappings: BTreeMap<ItemId, IdMapping>,
}

impl<M: NativeMenu> SystemMenuRegistry<M> {
    pub fn new(menu: M) -> Self {
        Self::with_options(menu, RegistryOptions::default())
    }

    pub fn with_options(menu: M, options: RegistryOptions) -> Self {
        Self {
            menu,
            options,
            configurations: HashMap::new(),
            processed: HashMap::new(),
            id_mappings: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    pub fn menu(&self) -> &M {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut M {
        &mut self.menu
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Replace the module's desired layout.
    ///
    /// The module stops being processed in every window, so the next [`Self::customize`]
    /// for any window materializes the new layout.
    pub fn set_configuration(&mut self, module: ModuleHandle, specs: Vec<MenuItemSpec>) {
        if self.options.reconfigure == ReconfigurePolicy::Eager {
            self.reset(module);
        }
        for modules in self.processed.values_mut() {
            modules.retain(|m| *m != module);
        }
        tracing::debug!(
            module = %module,
            items = specs.len(),
            policy = ?self.options.reconfigure,
            "Stored system menu configuration"
        );
        self.configurations.insert(module, specs);
    }

    pub fn has_custom_config(&self, module: ModuleHandle) -> bool {
        self.configurations.contains_key(&module)
    }

    pub fn configuration(&self, module: ModuleHandle) -> Option<&[MenuItemSpec]> {
        self.configurations.get(&module).map(Vec::as_slice)
    }

    // ------------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------------

    /// Materialize the module's layout into the window's system menu.
    ///
    /// Call every time the window's system menu is about to open. Returns `true` when entries
    /// were inserted, `false` when the module was already present or the menu rejected the
    /// leading separator.
    pub fn customize(&mut self, module: ModuleHandle, window: WindowHandle) -> bool {
        self.re_enable_custom_items(window);
        if self.is_processed(module, window) {
            return false;
        }
        self.purge_stale_entries(module, window);

        let anchor = self.menu.first_separator(window).unwrap_or_else(|err| {
            tracing::debug!(window = %window, "Could not scan system menu: {}", err);
            None
        });
        let position = anchor.map_or(0, |index| index + 1);

        let separator_id = next_item_id();
        if let Err(err) = self.menu.insert_separator(window, position, separator_id) {
            tracing::warn!(
                module = %module,
                window = %window,
                "Failed to insert system menu separator: {}",
                err
            );
            return false;
        }
        self.id_mappings.insert(
            separator_id,
            IdMapping {
                owner: module,
                name: SEPARATOR_NAME.to_string(),
                window,
            },
        );

        let specs = self.configurations.get(&module).cloned().unwrap_or_default();
        for spec in &specs {
            self.add_item(module, window, position, spec);
        }
        self.processed.entry(window).or_default().push(module);

        tracing::debug!(
            module = %module,
            window = %window,
            position,
            items = specs.len(),
            "Customized system menu"
        );
        true
    }

    fn add_item(
        &mut self,
        module: ModuleHandle,
        window: WindowHandle,
        position: usize,
        spec: &MenuItemSpec,
    ) -> bool {
        let id = next_item_id();
        if let Err(err) = self.menu.insert_item(window, position, id, &spec.name) {
            tracing::warn!(
                module = %module,
                window = %window,
                item = %spec.name,
                "Failed to insert system menu item: {}",
                err
            );
            return false;
        }
        self.id_mappings.insert(
            id,
            IdMapping {
                owner: module,
                name: spec.name.clone(),
                window,
            },
        );
        if spec.enable_by_default {
            if let Err(err) = self.menu.set_enabled(window, id, true) {
                tracing::debug!(item = %spec.name, "Failed to enable system menu item: {}", err);
            }
        }
        true
    }

    /// Force every default-enabled custom entry of `window` back to enabled.
    ///
    /// Some host applications grey out unknown entries each time the menu is opened.
    pub fn re_enable_custom_items(&mut self, window: WindowHandle) {
        for (id, mapping) in self.id_mappings.iter().filter(|(_, m)| m.window == window) {
            let enable = self
                .configurations
                .get(&mapping.owner)
                .is_some_and(|specs| {
                    specs
                        .iter()
                        .any(|spec| spec.name == mapping.name && spec.enable_by_default)
                });
            if enable {
                if let Err(err) = self.menu.set_enabled(window, *id, true) {
                    tracing::debug!(id = %id, "Failed to re-enable system menu item: {}", err);
                }
            }
        }
    }

    /// Delete entries the module left in `window` under a previous configuration
    fn purge_stale_entries(&mut self, module: ModuleHandle, window: WindowHandle) {
        let stale: Vec<ItemId> = self
            .id_mappings
            .iter()
            .filter(|(_, m)| m.owner == module && m.window == window)
            .map(|(id, _)| *id)
            .collect();
        if stale.is_empty() {
            return;
        }
        for id in &stale {
            self.id_mappings.remove(id);
            if let Err(err) = self.menu.delete_entry(window, *id) {
                tracing::debug!(id = %id, "Stale system menu entry already gone: {}", err);
            }
        }
        tracing::debug!(
            module = %module,
            window = %window,
            removed = stale.len(),
            "Purged stale system menu entries"
        );
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Remove every entry the module inserted, in every window, and forget its ids.
    ///
    /// The module's configuration is kept.
    pub fn reset(&mut self, module: ModuleHandle) {
        let owned: Vec<ItemId> = self
            .id_mappings
            .iter()
            .filter(|(_, m)| m.owner == module)
            .map(|(id, _)| *id)
            .collect();
        for id in &owned {
            if let Some(mapping) = self.id_mappings.remove(id) {
                if let Err(err) = self.menu.delete_entry(mapping.window, *id) {
                    tracing::debug!(id = %id, "Failed to delete system menu entry: {}", err);
                }
            }
        }
        for modules in self.processed.values_mut() {
            modules.retain(|m| *m != module);
        }
        tracing::debug!(module = %module, removed = owned.len(), "Reset system menu module");
    }

    // ------------------------------------------------------------------------
    // Event routing
    // ------------------------------------------------------------------------

    pub fn module_from_item_id(&self, id: ItemId) -> Option<ModuleHandle> {
        self.id_mappings.get(&id).map(|m| m.owner)
    }

    /// Display name of the entry, the separator sentinel for separators, or empty if unknown
    pub fn item_name_from_item_id(&self, id: ItemId) -> String {
        self.id_mappings
            .get(&id)
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }

    /// Resolve an activated id to the owning module. Separators never resolve.
    pub fn resolve_command(&self, id: ItemId) -> Option<MenuCommand> {
        let mapping = self.id_mappings.get(&id)?;
        if mapping.is_separator() {
            return None;
        }
        Some(MenuCommand {
            id,
            module: mapping.owner,
            item_name: mapping.name.clone(),
        })
    }

    /// Toggle the check mark of a checkable entry.
    ///
    /// Only acts when `module`'s configuration declares `item_name` checkable. The entry
    /// toggled is the first one in `window` carrying that name, whichever module owns it.
    pub fn process_selected_item(
        &mut self,
        module: ModuleHandle,
        window: WindowHandle,
        item_name: &str,
    ) {
        let checkable = self.configurations.get(&module).is_some_and(|specs| {
            specs
                .iter()
                .any(|spec| spec.name == item_name && spec.is_checkable)
        });
        if !checkable {
            return;
        }

        for (id, mapping) in &self.id_mappings {
            if mapping.name != item_name || mapping.window != window {
                continue;
            }
            match self.menu.is_checked(window, *id) {
                Ok(checked) => {
                    if let Err(err) = self.menu.set_checked(window, *id, !checked) {
                        tracing::warn!(id = %id, "Failed to toggle system menu item: {}", err);
                    }
                    return;
                }
                Err(err) => {
                    tracing::debug!(id = %id, "Skipping unreadable system menu item: {}", err);
                }
            }
        }
    }

    /// Resolve an activated id and apply its checkbox behaviour.
    ///
    /// The caller forwards the returned command to the owning module.
    pub fn handle_command(&mut self, window: WindowHandle, id: ItemId) -> Option<MenuCommand> {
        let command = self.resolve_command(id)?;
        self.process_selected_item(command.module, window, &command.item_name);
        Some(command)
    }

    pub fn is_checked(&self, window: WindowHandle, id: ItemId) -> Option<bool> {
        self.menu.is_checked(window, id).ok()
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn is_processed(&self, module: ModuleHandle, window: WindowHandle) -> bool {
        self.processed
            .get(&window)
            .is_some_and(|modules| modules.contains(&module))
    }

    /// Modules materialized into `window`, in the order they were customized
    pub fn processed_modules(&self, window: WindowHandle) -> &[ModuleHandle] {
        self.processed
            .get(&window)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Ids currently owned by `module`, ascending
    pub fn item_ids(&self, module: ModuleHandle) -> Vec<ItemId> {
        self.id_mappings
            .iter()
            .filter(|(_, m)| m.owner == module)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn id_mapping(&self, id: ItemId) -> Option<&IdMapping> {
        self.id_mappings.get(&id)
    }

    pub fn mapped_ids(&self) -> impl Iterator<Item = (ItemId, &IdMapping)> {
        self.id_mappings.iter().map(|(id, m)| (*id, m))
    }
}

// ============================================================================
// Tests
// ============================================================================
