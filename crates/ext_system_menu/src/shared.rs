//! Thread-safe handle to a registry.
//!
//! Every call takes one global lock, so reconfiguration is serialized against customization and
//! teardown for all windows.

use crate::native::NativeMenu;
use crate::registry::SystemMenuRegistry;
use crate::{ItemId, MenuCommand, MenuItemSpec, ModuleHandle, WindowHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable, lock-guarded [`SystemMenuRegistry`]
pub struct SharedSystemMenuRegistry<M> {
    inner: Arc<Mutex<SystemMenuRegistry<M>>>,
}

impl<M> Clone for SharedSystemMenuRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: NativeMenu> SharedSystemMenuRegistry<M> {
    pub fn new(registry: SystemMenuRegistry<M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Run several operations under a single lock acquisition
    pub fn with<R>(&self, f: impl FnOnce(&mut SystemMenuRegistry<M>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, SystemMenuRegistry<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_configuration(&self, module: ModuleHandle, specs: Vec<MenuItemSpec>) {
        self.lock().set_configuration(module, specs);
    }

    pub fn customize(&self, module: ModuleHandle, window: WindowHandle) -> bool {
        self.lock().customize(module, window)
    }

    pub fn reset(&self, module: ModuleHandle) {
        self.lock().reset(module);
    }

    pub fn has_custom_config(&self, module: ModuleHandle) -> bool {
        self.lock().has_custom_config(module)
    }

    pub fn module_from_item_id(&self, id: ItemId) -> Option<ModuleHandle> {
        self.lock().module_from_item_id(id)
    }

    pub fn item_name_from_item_id(&self, id: ItemId) -> String {
        self.lock().item_name_from_item_id(id)
    }

    pub fn process_selected_item(&self, module: ModuleHandle, window: WindowHandle, name: &str) {
        self.lock().process_selected_item(module, window, name);
    }

    pub fn handle_command(&self, window: WindowHandle, id: ItemId) -> Option<MenuCommand> {
        self.lock().handle_command(window, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemorySystemMenu;
    use std::thread;

    #[test]
    fn test_shared_registry_across_threads() {
        let mut menus = InMemorySystemMenu::new();
        let windows: Vec<WindowHandle> = (1..=4).map(|i| WindowHandle::from_raw(i * 0x10)).collect();
        for window in &windows {
            menus.add_standard_window(*window);
        }
        let shared = SharedSystemMenuRegistry::new(SystemMenuRegistry::new(menus));
        let module = ModuleHandle::from_raw(7);
        shared.set_configuration(module, vec![MenuItemSpec::new("Pin", true, true)]);

        let handles: Vec<_> = windows
            .iter()
            .map(|window| {
                let shared = shared.clone();
                let window = *window;
                thread::spawn(move || shared.customize(module, window))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        shared.with(|reg| {
            // one separator and one item per window
            assert_eq!(reg.item_ids(module).len(), 8);
            for window in &windows {
                assert!(reg.is_processed(module, *window));
            }
        });

        let pin = shared.with(|reg| {
            reg.mapped_ids()
                .find(|(_, m)| m.name == "Pin" && m.window == windows[0])
                .map(|(id, _)| id)
                .unwrap()
        });
        let command = shared.handle_command(windows[0], pin).unwrap();
        assert_eq!(command.module, module);
        assert_eq!(shared.with(|reg| reg.is_checked(windows[0], pin)), Some(true));

        shared.reset(module);
        assert_eq!(shared.module_from_item_id(pin), None);
        assert!(shared.has_custom_config(module));
    }
}
