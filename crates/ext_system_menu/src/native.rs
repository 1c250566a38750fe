//! Native system menu primitives.
//!
//! The registry never talks to the windowing system directly. Everything it needs from a
//! window's system menu goes through [`NativeMenu`], so the same bookkeeping runs against the
//! Win32 menu and against [`crate::InMemorySystemMenu`].

use crate::{ItemId, SystemMenuError, WindowHandle};

/// Type of an existing system menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Separator,
    Item,
}

/// Mutation and query primitives of a window's system menu.
///
/// Positions are zero-based. Ids passed to `delete_entry`, `is_checked`, `set_checked` and
/// `set_enabled` address entries by command id, not by position.
pub trait NativeMenu {
    /// Number of entries currently in the window's system menu.
    fn entry_count(&self, window: WindowHandle) -> Result<usize, SystemMenuError>;

    /// Type of the entry at `index`.
    fn entry_kind(&self, window: WindowHandle, index: usize) -> Result<EntryKind, SystemMenuError>;

    /// Insert a separator before the entry at `index` (appends past the end).
    fn insert_separator(
        &mut self,
        window: WindowHandle,
        index: usize,
        id: ItemId,
    ) -> Result<(), SystemMenuError>;

    /// Insert a text entry before the entry at `index`. New entries start disabled and
    /// unchecked.
    fn insert_item(
        &mut self,
        window: WindowHandle,
        index: usize,
        id: ItemId,
        label: &str,
    ) -> Result<(), SystemMenuError>;

    fn delete_entry(&mut self, window: WindowHandle, id: ItemId) -> Result<(), SystemMenuError>;

    fn is_checked(&self, window: WindowHandle, id: ItemId) -> Result<bool, SystemMenuError>;

    fn set_checked(
        &mut self,
        window: WindowHandle,
        id: ItemId,
        checked: bool,
    ) -> Result<(), SystemMenuError>;

    fn set_enabled(
        &mut self,
        window: WindowHandle,
        id: ItemId,
        enabled: bool,
    ) -> Result<(), SystemMenuError>;

    /// Position of the first separator, scanning from the top.
    ///
    /// Entries whose type cannot be read are skipped.
    fn first_separator(&self, window: WindowHandle) -> Result<Option<usize>, SystemMenuError> {
        let count = self.entry_count(window)?;
        Ok((0..count).find(|&index| {
            matches!(self.entry_kind(window, index), Ok(EntryKind::Separator))
        }))
    }
}
