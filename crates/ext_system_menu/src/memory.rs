//! In-memory system menus.
//!
//! Behaves like the Win32 system menu for every primitive the registry uses: positions past
//! the end append, by-command lookups hit the first entry with the id, and a destroyed window
//! rejects every call the way a stale HWND does.

use crate::native::{EntryKind, NativeMenu};
use crate::{ItemId, SystemMenuError, WindowHandle};
use std::collections::{HashMap, HashSet};

/// Command ids of the standard system menu entries
pub const SC_SIZE: u32 = 0xF000;
pub const SC_MOVE: u32 = 0xF010;
pub const SC_MINIMIZE: u32 = 0xF020;
pub const SC_MAXIMIZE: u32 = 0xF030;
pub const SC_CLOSE: u32 = 0xF060;
pub const SC_RESTORE: u32 = 0xF120;

/// Label used for separators in [`InMemorySystemMenu::labels`]
pub const SEPARATOR_LABEL: &str = "-";

/// One entry of a simulated system menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: ItemId,
    pub kind: EntryKind,
    pub label: String,
    pub enabled: bool,
    pub checked: bool,
}

impl MenuEntry {
    pub fn item(id: u32, label: impl Into<String>) -> Self {
        Self {
            id: ItemId::from_raw(id),
            kind: EntryKind::Item,
            label: label.into(),
            enabled: true,
            checked: false,
        }
    }

    pub fn separator(id: u32) -> Self {
        Self {
            id: ItemId::from_raw(id),
            kind: EntryKind::Separator,
            label: String::new(),
            enabled: true,
            checked: false,
        }
    }
}

/// Simulated system menus keyed by window
#[derive(Debug, Default)]
pub struct InMemorySystemMenu {
    menus: HashMap<WindowHandle, Vec<MenuEntry>>,
    rejecting_inserts: HashSet<WindowHandle>,
}

impl InMemorySystemMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window with an arbitrary menu, replacing any previous one
    pub fn add_window(&mut self, window: WindowHandle, entries: Vec<MenuEntry>) {
        self.menus.insert(window, entries);
    }

    /// Register a window with the default top-level window system menu:
    /// Restore, Move, Size, Minimize, Maximize, separator, Close.
    pub fn add_standard_window(&mut self, window: WindowHandle) {
        self.add_window(window, standard_system_menu());
    }

    /// Forget a window; later calls for it fail with `MenuUnavailable`
    pub fn destroy_window(&mut self, window: WindowHandle) -> bool {
        self.rejecting_inserts.remove(&window);
        self.menus.remove(&window).is_some()
    }

    /// Grey out every entry, as some host applications do each time the menu is opened
    pub fn disable_all(&mut self, window: WindowHandle) {
        if let Some(entries) = self.menus.get_mut(&window) {
            for entry in entries.iter_mut() {
                entry.enabled = false;
            }
        }
    }

    /// Make every insertion into `window` fail
    pub fn reject_inserts(&mut self, window: WindowHandle, reject: bool) {
        if reject {
            self.rejecting_inserts.insert(window);
        } else {
            self.rejecting_inserts.remove(&window);
        }
    }

    pub fn entries(&self, window: WindowHandle) -> Option<&[MenuEntry]> {
        self.menus.get(&window).map(Vec::as_slice)
    }

    pub fn entry(&self, window: WindowHandle, id: ItemId) -> Option<&MenuEntry> {
        self.menus.get(&window)?.iter().find(|e| e.id == id)
    }

    /// Entry labels top to bottom, separators rendered as [`SEPARATOR_LABEL`]
    pub fn labels(&self, window: WindowHandle) -> Vec<String> {
        self.entries(window)
            .unwrap_or_default()
            .iter()
            .map(|entry| match entry.kind {
                EntryKind::Separator => SEPARATOR_LABEL.to_string(),
                EntryKind::Item => entry.label.clone(),
            })
            .collect()
    }

    fn menu(&self, window: WindowHandle) -> Result<&Vec<MenuEntry>, SystemMenuError> {
        self.menus
            .get(&window)
            .ok_or_else(|| SystemMenuError::menu_unavailable(window))
    }

    fn menu_mut(&mut self, window: WindowHandle) -> Result<&mut Vec<MenuEntry>, SystemMenuError> {
        self.menus
            .get_mut(&window)
            .ok_or_else(|| SystemMenuError::menu_unavailable(window))
    }

    fn entry_mut(
        &mut self,
        window: WindowHandle,
        id: ItemId,
    ) -> Result<&mut MenuEntry, SystemMenuError> {
        self.menu_mut(window)?
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| SystemMenuError::entry_not_found(id))
    }

    fn insert(
        &mut self,
        window: WindowHandle,
        index: usize,
        entry: MenuEntry,
    ) -> Result<(), SystemMenuError> {
        if self.rejecting_inserts.contains(&window) {
            return Err(SystemMenuError::insert_rejected(format!(
                "window {} rejects insertions",
                window
            )));
        }
        let entries = self.menu_mut(window)?;
        let index = index.min(entries.len());
        entries.insert(index, entry);
        Ok(())
    }
}

impl NativeMenu for InMemorySystemMenu {
    fn entry_count(&self, window: WindowHandle) -> Result<usize, SystemMenuError> {
        Ok(self.menu(window)?.len())
    }

    fn entry_kind(&self, window: WindowHandle, index: usize) -> Result<EntryKind, SystemMenuError> {
        self.menu(window)?
            .get(index)
            .map(|e| e.kind)
            .ok_or_else(|| SystemMenuError::entry_not_found(format!("position {}", index)))
    }

    fn insert_separator(
        &mut self,
        window: WindowHandle,
        index: usize,
        id: ItemId,
    ) -> Result<(), SystemMenuError> {
        self.insert(window, index, MenuEntry::separator(id.raw()))
    }

    fn insert_item(
        &mut self,
        window: WindowHandle,
        index: usize,
        id: ItemId,
        label: &str,
    ) -> Result<(), SystemMenuError> {
        let entry = MenuEntry {
            enabled: false,
            ..MenuEntry::item(id.raw(), label)
        };
        self.insert(window, index, entry)
    }

    fn delete_entry(&mut self, window: WindowHandle, id: ItemId) -> Result<(), SystemMenuError> {
        let entries = self.menu_mut(window)?;
        let position = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| SystemMenuError::delete_rejected(format!("no entry {}", id)))?;
        entries.remove(position);
        Ok(())
    }

    fn is_checked(&self, window: WindowHandle, id: ItemId) -> Result<bool, SystemMenuError> {
        self.menu(window)?
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.checked)
            .ok_or_else(|| SystemMenuError::entry_not_found(id))
    }

    fn set_checked(
        &mut self,
        window: WindowHandle,
        id: ItemId,
        checked: bool,
    ) -> Result<(), SystemMenuError> {
        self.entry_mut(window, id)?.checked = checked;
        Ok(())
    }

    fn set_enabled(
        &mut self,
        window: WindowHandle,
        id: ItemId,
        enabled: bool,
    ) -> Result<(), SystemMenuError> {
        self.entry_mut(window, id)?.enabled = enabled;
        Ok(())
    }
}

/// The system menu of a freshly created overlapped window
pub fn standard_system_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry::item(SC_RESTORE, "Restore"),
        MenuEntry::item(SC_MOVE, "Move"),
        MenuEntry::item(SC_SIZE, "Size"),
        MenuEntry::item(SC_MINIMIZE, "Minimize"),
        MenuEntry::item(SC_MAXIMIZE, "Maximize"),
        MenuEntry::separator(0),
        MenuEntry::item(SC_CLOSE, "Close"),
    ]
}
