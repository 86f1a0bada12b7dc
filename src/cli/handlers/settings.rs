use super::{CmdResult, Ctx, print_json};
use crate::cli::commands::*;
use crate::io::config_io::{self, ConfigKey};
use crate::io::lock::WorkspaceLock;
use crate::io::store::LocalStore;
use crate::io::workspace_io::Workspace;
use crate::model::config::{AppConfig, ColumnsConfig};
use crate::model::object::WorkStatus;
use crate::model::status::StatusOption;
use crate::sheet::Column;
use crate::sheet::layout::{self, ColumnLayout, LayoutError};
use crate::util::unicode::{display_width, pad_to_width};

const DEFAULT_COLOR: &str = "gray";

pub(super) fn cmd_status(ctx: &Ctx, cmd: StatusCmd) -> CmdResult {
    let ws = ctx.workspace()?;
    match cmd.action {
        StatusAction::List => {
            let registry = LocalStore::open(&ws.dir).status_registry();
            if ctx.json {
                return print_json(registry.options());
            }
            let label_w = registry
                .options()
                .iter()
                .map(|o| display_width(&o.label))
                .max()
                .unwrap_or(0);
            for o in registry.options() {
                println!(
                    "{:<12} {}  {:<8} {}",
                    o.value.as_str(),
                    pad_to_width(&o.label, label_w),
                    o.color,
                    o.badge_classes()
                );
            }
            Ok(())
        }
        StatusAction::Set(args) => {
            let value = WorkStatus::parse(args.value.trim()).ok_or_else(|| {
                format!(
                    "invalid work status: {} (expected not-started, in-progress, paused or completed)",
                    args.value
                )
            })?;
            let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
            let mut store = LocalStore::open(&ws.dir);
            let mut registry = store.status_registry();
            let mut options = registry.options().to_vec();

            let existing = options.iter().position(|o| o.value == value);
            let current = existing.map(|i| options[i].clone());
            let label = args
                .label
                .or_else(|| current.as_ref().map(|o| o.label.clone()))
                .unwrap_or_else(|| value.as_str().to_string());
            if label.trim().is_empty() {
                return Err("label cannot be empty".into());
            }
            let color = args
                .color
                .or_else(|| current.as_ref().map(|o| o.color.clone()))
                .unwrap_or_else(|| DEFAULT_COLOR.to_string());
            let option = StatusOption::with_color(value, label.trim(), color.trim());

            match existing {
                Some(i) => options[i] = option,
                None => options.push(option),
            }
            registry.set_options(options)?;
            store.set_status_registry(&registry)?;
            store.save()?;
            println!("{} -> {}", value, registry.label(value));
            Ok(())
        }
        StatusAction::Reset => {
            let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
            let mut store = LocalStore::open(&ws.dir);
            let mut registry = store.status_registry();
            registry.reset_options();
            store.set_status_registry(&registry)?;
            store.save()?;
            println!("status options reset");
            Ok(())
        }
    }
}

#[derive(serde::Serialize)]
struct ColumnJson<'a> {
    key: &'static str,
    label: &'static str,
    position: Option<usize>,
    group: Option<&'a str>,
}

fn parse_columns(args: &[String]) -> Result<Vec<Column>, layout::LayoutError> {
    args.iter().map(|a| layout::parse_column(a)).collect()
}

pub(super) fn cmd_columns(ctx: &Ctx, cmd: ColumnsCmd) -> CmdResult {
    let ws = ctx.workspace()?;
    match cmd.action.unwrap_or(ColumnsAction::List) {
        ColumnsAction::List => list_columns(ctx, &ws.config.columns),
        ColumnsAction::Show(args) => edit_columns(&ws, |current| {
            let next = layout::show_columns(current, &parse_columns(&args.columns)?)?;
            Ok((Some(next), format!("shown: {}", args.columns.join(", "))))
        }),
        ColumnsAction::Hide(args) => edit_columns(&ws, |current| {
            let next = layout::hide_columns(current, &parse_columns(&args.columns)?)?;
            Ok((Some(next), format!("hidden: {}", args.columns.join(", "))))
        }),
        ColumnsAction::Move(args) => edit_columns(&ws, |current| {
            let column = layout::parse_column(&args.column)?;
            let next = layout::move_column(current, column, args.position)?;
            Ok((Some(next), format!("moved {} to {}", column.key(), args.position)))
        }),
        ColumnsAction::Group(args) => edit_columns(&ws, |current| {
            let columns = parse_columns(&args.columns)?;
            let next = layout::set_group(current, &args.label, &columns)?;
            Ok((Some(next), format!("group {}: {} columns", args.label.trim(), columns.len())))
        }),
        ColumnsAction::Ungroup(args) => edit_columns(&ws, |current| {
            let next = layout::remove_group(current, &args.label)?;
            Ok((Some(next), format!("removed group {}", args.label.trim())))
        }),
        ColumnsAction::Collapse(args) => edit_columns(&ws, |current| {
            let next = layout::set_collapsed(current, &args.label, true)?;
            Ok((Some(next), format!("collapsed {}", args.label.trim())))
        }),
        ColumnsAction::Expand(args) => edit_columns(&ws, |current| {
            let next = layout::set_collapsed(current, &args.label, false)?;
            Ok((Some(next), format!("expanded {}", args.label.trim())))
        }),
        ColumnsAction::Reset => edit_columns(&ws, |_| Ok((None, "columns reset".to_string()))),
    }
}

fn list_columns(ctx: &Ctx, columns: &ColumnsConfig) -> CmdResult {
    let rows = layout::describe(columns)?;
    if ctx.json {
        let out: Vec<ColumnJson> = rows
            .iter()
            .map(|(c, position, group)| ColumnJson {
                key: c.key(),
                label: c.label(),
                position: *position,
                group: *group,
            })
            .collect();
        return print_json(&out);
    }
    let key_w = rows.iter().map(|(c, _, _)| display_width(c.key())).max().unwrap_or(0);
    for (column, position, group) in &rows {
        let position = position.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:>2}  {}  {}{}",
            position,
            pad_to_width(column.key(), key_w),
            column.label(),
            group.map(|g| format!("  [{}]", g)).unwrap_or_default()
        );
    }
    Ok(())
}

/// Rewrite `[columns]` under the workspace lock. `None` from `edit` drops
/// the table so the default layout applies.
fn edit_columns<F>(ws: &Workspace, edit: F) -> CmdResult
where
    F: FnOnce(&ColumnsConfig) -> Result<(Option<ColumnsConfig>, String), LayoutError>,
{
    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
    let (config, mut doc) = config_io::read_config(&ws.dir)?;
    let (next, message) = edit(&config.columns)?;
    match next {
        Some(next) => {
            ColumnLayout::from_config(&next)?;
            config_io::set_columns(&mut doc, &next);
        }
        None => config_io::reset_columns(&mut doc),
    }
    config_io::write_config(&ws.dir, &doc)?;
    println!("{}", message);
    Ok(())
}

pub(super) fn cmd_config(ctx: &Ctx, cmd: ConfigCmd) -> CmdResult {
    let ws = ctx.workspace()?;
    match cmd.action {
        ConfigAction::Show => {
            if ctx.json {
                return print_json(&ws.config);
            }
            print!("{}", toml::to_string_pretty(&ws.config)?);
            Ok(())
        }
        ConfigAction::Set(args) => {
            let key = ConfigKey::parse(&args.key)?;
            let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
            let (_, mut doc) = config_io::read_config(&ws.dir)?;
            config_io::set_value(&mut doc, key, &args.value)?;
            // refuse to write a file the next command could not load
            toml::from_str::<AppConfig>(&doc.to_string())?;
            config_io::write_config(&ws.dir, &doc)?;
            println!("{} = {}", key.path(), args.value);
            Ok(())
        }
    }
}
