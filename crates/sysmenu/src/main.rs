use anyhow::{anyhow, Context, Result};
use ext_system_menu::memory::SEPARATOR_LABEL;
use ext_system_menu::{
    EntryKind, InMemorySystemMenu, ItemId, MenuLayoutConfig, SystemMenuRegistry, WindowHandle,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{env, process};

/// Window that `preview` customizes
const PREVIEW_WINDOW: WindowHandle = WindowHandle::from_raw(0x1);

fn usage() {
    eprintln!("sysmenu <check|preview> <layout.toml>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  check <layout.toml>     Validate a layout and summarize each module");
    eprintln!("  preview <layout.toml>   Show a standard system menu after every module customized it");
    eprintln!();
    eprintln!("Set SYSMENU_LOG (e.g. SYSMENU_LOG=debug) to see registry logs.");
}

fn load(path: &Path) -> Result<MenuLayoutConfig> {
    MenuLayoutConfig::load(path).with_context(|| format!("invalid layout {}", path.display()))
}

fn cmd_check(path: &Path) -> Result<()> {
    let config = load(path)?;
    println!("{}: ok", path.display());
    println!("reconfigure policy: {:?}", config.options.reconfigure);
    for (index, module) in config.modules.iter().enumerate() {
        let checkable = module.items.iter().filter(|i| i.is_checkable).count();
        let enabled = module.items.iter().filter(|i| i.enable_by_default).count();
        println!(
            "  {} {}: {} item(s), {} enabled by default, {} checkable",
            MenuLayoutConfig::module_handle(index),
            module.name,
            module.items.len(),
            enabled,
            checkable
        );
    }
    Ok(())
}

/// One line of the preview
#[derive(Debug, Clone, PartialEq, Eq)]
struct PreviewRow {
    id: ItemId,
    label: String,
    owner: Option<String>,
    enabled: bool,
    checked: bool,
}

fn preview_rows(config: &MenuLayoutConfig) -> Result<Vec<PreviewRow>> {
    let mut menus = InMemorySystemMenu::new();
    menus.add_standard_window(PREVIEW_WINDOW);
    let mut registry = SystemMenuRegistry::with_options(menus, config.options);

    let modules = config.register_all(&mut registry);
    for (handle, name) in &modules {
        if !registry.customize(*handle, PREVIEW_WINDOW) {
            tracing::warn!(module = %name, "Module left the menu untouched");
        }
    }
    registry.re_enable_custom_items(PREVIEW_WINDOW);

    let names: HashMap<_, _> = modules.into_iter().collect();
    let entries = registry
        .menu()
        .entries(PREVIEW_WINDOW)
        .ok_or_else(|| anyhow!("preview window has no menu"))?;

    Ok(entries
        .iter()
        .map(|entry| PreviewRow {
            id: entry.id,
            label: match entry.kind {
                EntryKind::Separator => SEPARATOR_LABEL.to_string(),
                EntryKind::Item => entry.label.clone(),
            },
            owner: registry
                .module_from_item_id(entry.id)
                .and_then(|handle| names.get(&handle).cloned()),
            enabled: entry.enabled,
            checked: entry.checked,
        })
        .collect())
}

fn cmd_preview(path: &Path) -> Result<()> {
    let config = load(path)?;
    let rows = preview_rows(&config)?;

    println!("{:>3}  {:<12} {:<28} {:<8} owner", "#", "id", "label", "state");
    for (index, row) in rows.iter().enumerate() {
        let state = match (row.enabled, row.checked) {
            (true, true) => "on",
            (true, false) => "",
            (false, _) => "disabled",
        };
        println!(
            "{:>3}  {:<12} {:<28} {:<8} {}",
            index,
            row.id.to_string(),
            row.label,
            state,
            row.owner.as_deref().unwrap_or("system")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("SYSMENU_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 2 {
        usage();
        process::exit(2);
    }

    let cmd = args.remove(0);
    let path = PathBuf::from(args.remove(0));

    match cmd.as_str() {
        "check" => cmd_check(&path)?,
        "preview" => cmd_preview(&path)?,
        _ => {
            usage();
            process::exit(2);
        }
    }
    Ok(())
}
