//! Win32 system menu backend.

use crate::native::{EntryKind, NativeMenu};
use crate::{ItemId, SystemMenuError, WindowHandle};
use windows::core::PWSTR;
use windows::Win32::Foundation::{BOOL, HWND};
use windows::Win32::UI::WindowsAndMessaging::{
    CheckMenuItem, DeleteMenu, EnableMenuItem, GetMenuItemCount, GetMenuItemInfoW, GetMenuState,
    GetSystemMenu, InsertMenuItemW, HMENU, MENUITEMINFOW, MENU_ITEM_STATE, MFS_DISABLED,
    MFS_UNCHECKED, MFT_SEPARATOR, MF_BYCOMMAND, MF_CHECKED, MF_ENABLED, MF_GRAYED, MF_UNCHECKED,
    MIIM_FTYPE, MIIM_ID, MIIM_STATE, MIIM_STRING,
};

/// `GetMenuState` result for an id that is not in the menu
const MENU_STATE_NOT_FOUND: u32 = u32::MAX;

/// Operates on the live system menu of each window through `GetSystemMenu`.
///
/// Must be used from the thread that owns the windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32SystemMenu;

impl Win32SystemMenu {
    pub fn new() -> Self {
        Self
    }

    fn system_menu(&self, window: WindowHandle) -> Result<HMENU, SystemMenuError> {
        let hwnd = HWND(window.raw() as *mut core::ffi::c_void);
        let menu = unsafe { GetSystemMenu(hwnd, BOOL::from(false)) };
        if menu.is_invalid() {
            return Err(SystemMenuError::menu_unavailable(window));
        }
        Ok(menu)
    }

    fn insert(
        &self,
        window: WindowHandle,
        index: usize,
        info: &MENUITEMINFOW,
    ) -> Result<(), SystemMenuError> {
        let menu = self.system_menu(window)?;
        unsafe { InsertMenuItemW(menu, index as u32, BOOL::from(true), info) }
            .map_err(|e| SystemMenuError::insert_rejected(e.message()))
    }
}

impl NativeMenu for Win32SystemMenu {
    fn entry_count(&self, window: WindowHandle) -> Result<usize, SystemMenuError> {
        let menu = self.system_menu(window)?;
        let count = unsafe { GetMenuItemCount(menu) };
        usize::try_from(count).map_err(|_| SystemMenuError::menu_unavailable(window))
    }

    fn entry_kind(&self, window: WindowHandle, index: usize) -> Result<EntryKind, SystemMenuError> {
        let menu = self.system_menu(window)?;
        let mut info = MENUITEMINFOW {
            cbSize: std::mem::size_of::<MENUITEMINFOW>() as u32,
            fMask: MIIM_FTYPE,
            ..Default::default()
        };
        unsafe { GetMenuItemInfoW(menu, index as u32, BOOL::from(true), &mut info) }
            .map_err(|_| SystemMenuError::entry_not_found(format!("position {}", index)))?;
        if info.fType.0 & MFT_SEPARATOR.0 != 0 {
            Ok(EntryKind::Separator)
        } else {
            Ok(EntryKind::Item)
        }
    }

    fn insert_separator(
        &mut self,
        window: WindowHandle,
        index: usize,
        id: ItemId,
    ) -> Result<(), SystemMenuError> {
        let info = MENUITEMINFOW {
            cbSize: std::mem::size_of::<MENUITEMINFOW>() as u32,
            fMask: MIIM_ID | MIIM_FTYPE,
            fType: MFT_SEPARATOR,
            wID: id.raw(),
            ..Default::default()
        };
        self.insert(window, index, &info)
    }

    fn insert_item(
        &mut self,
        window: WindowHandle,
        index: usize,
        id: ItemId,
        label: &str,
    ) -> Result<(), SystemMenuError> {
        let mut text: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
        let info = MENUITEMINFOW {
            cbSize: std::mem::size_of::<MENUITEMINFOW>() as u32,
            fMask: MIIM_ID | MIIM_STRING | MIIM_STATE,
            fState: MENU_ITEM_STATE(MFS_UNCHECKED.0 | MFS_DISABLED.0),
            wID: id.raw(),
            dwTypeData: PWSTR(text.as_mut_ptr()),
            cch: (text.len() - 1) as u32,
            ..Default::default()
        };
        // InsertMenuItemW copies the string, so `text` only has to outlive the call.
        self.insert(window, index, &info)
    }

    fn delete_entry(&mut self, window: WindowHandle, id: ItemId) -> Result<(), SystemMenuError> {
        let menu = self.system_menu(window)?;
        unsafe { DeleteMenu(menu, id.raw(), MF_BYCOMMAND) }
            .map_err(|e| SystemMenuError::delete_rejected(e.message()))
    }

    fn is_checked(&self, window: WindowHandle, id: ItemId) -> Result<bool, SystemMenuError> {
        let menu = self.system_menu(window)?;
        let state = unsafe { GetMenuState(menu, id.raw(), MF_BYCOMMAND) };
        if state == MENU_STATE_NOT_FOUND {
            return Err(SystemMenuError::entry_not_found(id));
        }
        Ok(state & MF_CHECKED.0 != 0)
    }

    fn set_checked(
        &mut self,
        window: WindowHandle,
        id: ItemId,
        checked: bool,
    ) -> Result<(), SystemMenuError> {
        let menu = self.system_menu(window)?;
        let flag = if checked { MF_CHECKED } else { MF_UNCHECKED };
        let previous = unsafe { CheckMenuItem(menu, id.raw(), (MF_BYCOMMAND | flag).0) };
        if previous == MENU_STATE_NOT_FOUND {
            return Err(SystemMenuError::entry_not_found(id));
        }
        Ok(())
    }

    fn set_enabled(
        &mut self,
        window: WindowHandle,
        id: ItemId,
        enabled: bool,
    ) -> Result<(), SystemMenuError> {
        let menu = self.system_menu(window)?;
        let flag = if enabled { MF_ENABLED } else { MF_GRAYED };
        let previous = unsafe { EnableMenuItem(menu, id.raw(), MF_BYCOMMAND | flag) };
        if previous.0 == -1 {
            return Err(SystemMenuError::entry_not_found(id));
        }
        Ok(())
    }
}
