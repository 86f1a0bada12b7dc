use super::{CmdResult, Ctx, print_json};
use crate::cli::commands::{ExportArgs, ImportArgs};
use crate::model::object::ProjectObject;
use crate::sheet::{self, ExportScope};

pub(super) fn cmd_export(ctx: &Ctx, args: ExportArgs) -> CmdResult {
    let loaded = ctx.load()?;
    let registry = loaded.registry();
    let project = loaded.project(args.scope.project.as_deref())?;

    let scope = if args.selected {
        ExportScope::Selected
    } else {
        ExportScope::All
    };
    let objects: Vec<&ProjectObject> = match scope {
        ExportScope::All => project.objects.iter().collect(),
        ExportScope::Selected => project
            .objects
            .iter()
            .filter(|o| loaded.state.selection.contains(&o.id))
            .collect(),
    };
    if scope == ExportScope::Selected && objects.is_empty() {
        return Err(format!("no selected objects in {}", project.id).into());
    }

    let dir = match args.out {
        Some(out) => ctx.resolve(&out),
        None if !loaded.ws.config.export.dir.is_empty() => loaded.ws.root.join(&loaded.ws.config.export.dir),
        None => ctx.start.clone(),
    };
    std::fs::create_dir_all(&dir)?;

    let date = chrono::Local::now().date_naive();
    let path = sheet::export_to_path(project, &objects, &registry, scope, &dir, date)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "path": path,
            "rows": objects.len(),
        }));
    }
    println!("exported {} objects to {}", objects.len(), path.display());
    Ok(())
}

pub(super) fn cmd_import(ctx: &Ctx, args: ImportArgs) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let registry = loaded.registry();
    let project = loaded.project(args.scope.project.as_deref())?;
    let outcome = sheet::import_file(project, &ctx.resolve(&args.file), &registry)
        .map_err(|e| format!("import of {} failed: {}", args.file, e))?;
    let next = loaded.portfolio.with_project(outcome.project);
    loaded.commit(next)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "created": outcome.created,
            "updated": outcome.updated,
        }));
    }
    println!("imported {}: {} created, {} updated", args.file, outcome.created, outcome.updated);
    Ok(())
}
