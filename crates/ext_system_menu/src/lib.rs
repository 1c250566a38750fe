//! System menu customization for independently loaded modules.
//!
//! Modules register the custom entries they want in a window's title-bar menu. The
//! [`SystemMenuRegistry`] materializes them into a window's native system menu when the menu
//! is opened, keeps track of which modules already customized which windows, and routes
//! activated menu ids back to the module that owns them.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod memory;
pub mod native;
pub mod registry;
pub mod shared;
#[cfg(target_os = "windows")]
pub mod win32;

pub use config::{parse_items_json, MenuLayoutConfig, ModuleLayout};
pub use memory::InMemorySystemMenu;
pub use native::{EntryKind, NativeMenu};
pub use registry::{ReconfigurePolicy, RegistryOptions, SystemMenuRegistry};
pub use shared::SharedSystemMenuRegistry;
#[cfg(target_os = "windows")]
pub use win32::Win32SystemMenu;

// ============================================================================
// Error Types (8100+ range)
// ============================================================================

/// Error codes for system menu operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SystemMenuErrorCode {
    /// The window has no accessible system menu
    MenuUnavailable = 8100,
    /// No entry with the requested id or position
    EntryNotFound = 8101,
    /// The native menu refused an insertion
    InsertRejected = 8102,
    /// The native menu refused a deletion
    DeleteRejected = 8103,
    /// A menu layout failed validation
    InvalidConfig = 8104,
    /// A menu layout file could not be read
    ConfigIo = 8105,
    /// A menu layout could not be parsed
    ConfigParse = 8106,
}

/// Custom error type for system menu operations
#[derive(Debug, thiserror::Error)]
pub enum SystemMenuError {
    #[error("[{code}] System menu unavailable for window {window}")]
    MenuUnavailable { code: u32, window: WindowHandle },

    #[error("[{code}] Menu entry not found: {entry}")]
    EntryNotFound { code: u32, entry: String },

    #[error("[{code}] Insert rejected: {message}")]
    InsertRejected { code: u32, message: String },

    #[error("[{code}] Delete rejected: {message}")]
    DeleteRejected { code: u32, message: String },

    #[error("[{code}] Invalid menu layout: {message}")]
    InvalidConfig { code: u32, message: String },

    #[error("[{code}] Failed to read menu layout: {message}")]
    ConfigIo { code: u32, message: String },

    #[error("[{code}] Failed to parse menu layout: {message}")]
    ConfigParse { code: u32, message: String },
}

impl SystemMenuError {
    pub fn menu_unavailable(window: WindowHandle) -> Self {
        Self::MenuUnavailable {
            code: SystemMenuErrorCode::MenuUnavailable as u32,
            window,
        }
    }

    pub fn entry_not_found(entry: impl fmt::Display) -> Self {
        Self::EntryNotFound {
            code: SystemMenuErrorCode::EntryNotFound as u32,
            entry: entry.to_string(),
        }
    }

    pub fn insert_rejected(message: impl Into<String>) -> Self {
        Self::InsertRejected {
            code: SystemMenuErrorCode::InsertRejected as u32,
            message: message.into(),
        }
    }

    pub fn delete_rejected(message: impl Into<String>) -> Self {
        Self::DeleteRejected {
            code: SystemMenuErrorCode::DeleteRejected as u32,
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: SystemMenuErrorCode::InvalidConfig as u32,
            message: message.into(),
        }
    }

    pub fn config_io(message: impl Into<String>) -> Self {
        Self::ConfigIo {
            code: SystemMenuErrorCode::ConfigIo as u32,
            message: message.into(),
        }
    }

    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            code: SystemMenuErrorCode::ConfigParse as u32,
            message: message.into(),
        }
    }
}

// ============================================================================
// Data Types
// ============================================================================

/// Display name recorded for separator entries in the id mapping
pub const SEPARATOR_NAME: &str = "separator_dummy_name";

/// Opaque identity of a feature module.
///
/// The registry only uses it as a key; the module itself is owned by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleHandle(u64);

impl ModuleHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Raw native window handle (HWND on Windows).
///
/// Borrowed: the registry never creates or destroys the window behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowHandle(isize);

impl WindowHandle {
    pub const fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> isize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Identifier of one inserted native menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A module's declaration of one custom system menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemSpec {
    pub name: String,
    #[serde(default, alias = "enable_by_default")]
    pub enable_by_default: bool,
    #[serde(default, alias = "is_checkable")]
    pub is_checkable: bool,
}

impl MenuItemSpec {
    pub fn new(name: impl Into<String>, enable_by_default: bool, is_checkable: bool) -> Self {
        Self {
            name: name.into(),
            enable_by_default,
            is_checkable,
        }
    }
}

/// Owner of a generated id, plus the window the entry was inserted into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMapping {
    pub owner: ModuleHandle,
    pub name: String,
    pub window: WindowHandle,
}

impl IdMapping {
    pub fn is_separator(&self) -> bool {
        self.name == SEPARATOR_NAME
    }
}

/// An activated custom menu entry resolved back to its module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuCommand {
    pub id: ItemId,
    pub module: ModuleHandle,
    pub item_name: String,
}

// ============================================================================
// Tests
// ============================================================================
