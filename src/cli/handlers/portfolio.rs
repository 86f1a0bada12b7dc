use super::{CmdResult, Ctx, parse_date, print_json, print_lines};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::model::config::StageDeletePolicy;
use crate::model::ids::{ObjectId, StageId};
use crate::model::object::{ConnectionType, DeliveryStage, Operator, ProjectObject, WorkStatus};
use crate::model::project::{ProjectDraft, ProjectHealth, ProjectKind};
use crate::model::stage::{StageDraft, StageStatus};
use crate::model::status::StatusRegistry;
use crate::model::violation::VIOLATION_CATALOG;
use crate::ops::filter::{DeliveryFilter, ObjectFilter, StageFilter, StatusCategory, filter_objects};
use crate::ops::selection::VisibleToggle;
use crate::ops::{check, object_ops, project_ops, stage_ops};
use crate::sheet::ColumnLayout;

fn parse_kind(s: &str) -> Result<ProjectKind, String> {
    ProjectKind::parse(s).ok_or_else(|| format!("invalid project type: {} (expected road, bridge or utility)", s))
}

fn parse_health(s: &str) -> Result<ProjectHealth, String> {
    ProjectHealth::parse(s).ok_or_else(|| format!("invalid project status: {} (expected on-track, at-risk or delayed)", s))
}

fn parse_stage_status(s: &str) -> Result<StageStatus, String> {
    StageStatus::parse(s).ok_or_else(|| format!("invalid stage status: {} (expected completed, in-progress or pending)", s))
}

/// A status value (`paused`) or one of the registry's labels (`Приостановлено`)
pub(super) fn parse_work_status(s: &str, registry: &StatusRegistry) -> Result<WorkStatus, String> {
    registry
        .parse_label(s)
        .ok_or_else(|| format!("invalid work status: {} (expected not-started, in-progress, paused or completed)", s))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub(super) fn cmd_projects(ctx: &Ctx) -> CmdResult {
    let loaded = ctx.load()?;
    let active = loaded.state.active_project.as_ref();
    if ctx.json {
        let out: Vec<_> = loaded
            .portfolio
            .projects
            .iter()
            .map(|p| project_to_json(p, active))
            .collect();
        return print_json(&out);
    }
    if loaded.portfolio.projects.is_empty() {
        println!("no projects");
    } else {
        print_lines(&format_projects(&loaded.portfolio.projects, active));
    }
    Ok(())
}

pub(super) fn cmd_project(ctx: &Ctx, cmd: ProjectCmd) -> CmdResult {
    match cmd.action {
        ProjectAction::Add(args) => project_add(ctx, args),
        ProjectAction::Edit(args) => project_edit(ctx, args),
        ProjectAction::Rm(args) => project_rm(ctx, args),
        ProjectAction::Show(args) => project_show(ctx, args),
        ProjectAction::Open(args) => project_open(ctx, args),
    }
}

fn project_add(ctx: &Ctx, args: ProjectAddArgs) -> CmdResult {
    let draft = ProjectDraft {
        name: args.name,
        kind: parse_kind(&args.kind)?,
        progress: args.progress,
        budget: args.budget,
        spent: args.spent,
        status: parse_health(&args.status)?,
        start_date: parse_date(&args.start)?,
        end_date: parse_date(&args.end)?,
    };
    let mut loaded = ctx.load_for_write()?;
    let (next, id) = project_ops::add_project(&loaded.portfolio, draft)?;
    loaded.commit(next)?;
    println!("{}", id);
    Ok(())
}

fn project_edit(ctx: &Ctx, args: ProjectEditArgs) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let project = loaded.project(Some(args.id.as_str()))?;
    let id = project.id.clone();
    let mut draft = ProjectDraft::from(project);
    if let Some(name) = args.name {
        draft.name = name;
    }
    if let Some(kind) = args.kind {
        draft.kind = parse_kind(&kind)?;
    }
    if let Some(start) = args.start {
        draft.start_date = parse_date(&start)?;
    }
    if let Some(end) = args.end {
        draft.end_date = parse_date(&end)?;
    }
    if let Some(budget) = args.budget {
        draft.budget = budget;
    }
    if let Some(spent) = args.spent {
        draft.spent = spent;
    }
    if let Some(progress) = args.progress {
        draft.progress = progress;
    }
    if let Some(status) = args.status {
        draft.status = parse_health(&status)?;
    }
    let next = project_ops::update_project(&loaded.portfolio, &id, draft)?;
    loaded.commit(next)?;
    println!("updated {}", id);
    Ok(())
}

fn project_rm(ctx: &Ctx, args: IdArg) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let id = loaded.project_id(Some(args.id.as_str()))?;
    let (next, removed) = project_ops::delete_project(&loaded.portfolio, &id)?;
    loaded.commit(next)?;
    println!("deleted {} ({} objects)", id, removed.len());
    Ok(())
}

fn project_show(ctx: &Ctx, args: OptionalIdArg) -> CmdResult {
    let loaded = ctx.load()?;
    let project = loaded.project(args.id.as_deref())?;
    if ctx.json {
        return print_json(project);
    }
    print_lines(&format_project_detail(project));
    Ok(())
}

fn project_open(ctx: &Ctx, args: IdArg) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let id = loaded.project_id(Some(args.id.as_str()))?;
    loaded.state.active_project = Some(id.clone());
    // a stage filter from another project would match nothing
    loaded.state.filter = ObjectFilter::default();
    loaded.save_state()?;
    println!("opened {}", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

pub(super) fn cmd_stages(ctx: &Ctx, scope: ProjectScope) -> CmdResult {
    let loaded = ctx.load()?;
    let project = loaded.project(scope.project.as_deref())?;
    if ctx.json {
        return print_json(&project.stages);
    }
    if project.stages.is_empty() {
        println!("no stages");
    } else {
        print_lines(&format_stages(project));
    }
    Ok(())
}

pub(super) fn cmd_stage(ctx: &Ctx, cmd: StageCmd) -> CmdResult {
    match cmd.action {
        StageAction::Add(args) => stage_add(ctx, args),
        StageAction::Edit(args) => stage_edit(ctx, args),
        StageAction::Rm(args) => stage_rm(ctx, args),
    }
}

fn stage_add(ctx: &Ctx, args: StageAddArgs) -> CmdResult {
    let draft = StageDraft {
        name: args.name,
        progress: args.progress,
        start_date: parse_date(&args.start)?,
        end_date: parse_date(&args.end)?,
        status: parse_stage_status(&args.status)?,
    };
    let mut loaded = ctx.load_for_write()?;
    let project = loaded.project(args.scope.project.as_deref())?;
    let (next, id) = stage_ops::add_stage(project, draft)?;
    let next = loaded.portfolio.with_project(next);
    loaded.commit(next)?;
    println!("{}", id);
    Ok(())
}

fn stage_edit(ctx: &Ctx, args: StageEditArgs) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let project = loaded.project(args.scope.project.as_deref())?;
    let id = StageId::new(args.id);
    let stage = project
        .stage(&id)
        .ok_or_else(|| format!("stage not found: {}", id))?;
    let mut draft = StageDraft::from(stage);
    if let Some(name) = args.name {
        draft.name = name;
    }
    if let Some(start) = args.start {
        draft.start_date = parse_date(&start)?;
    }
    if let Some(end) = args.end {
        draft.end_date = parse_date(&end)?;
    }
    if let Some(progress) = args.progress {
        draft.progress = progress;
    }
    if let Some(status) = args.status {
        draft.status = parse_stage_status(&status)?;
    }
    let next = stage_ops::update_stage(project, &id, draft)?;
    let next = loaded.portfolio.with_project(next);
    loaded.commit(next)?;
    println!("updated {}", id);
    Ok(())
}

fn stage_rm(ctx: &Ctx, args: StageRmArgs) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let policy = match args.policy.as_deref() {
        Some(p) => StageDeletePolicy::parse(p).ok_or_else(|| format!("invalid policy: {} (expected cascade or detach)", p))?,
        None => loaded.ws.config.stages.on_delete,
    };
    let project = loaded.project(args.scope.project.as_deref())?;
    let id = StageId::new(args.id);
    let removal = stage_ops::delete_stage(project, &id, policy);
    if !removal.found {
        return Err(format!("stage not found: {}", id).into());
    }
    let next = loaded.portfolio.with_project(removal.project);
    if loaded.state.filter.stage == StageFilter::Stage(id.clone()) {
        loaded.state.filter.stage = StageFilter::All;
        loaded.commit_with_state(next)?;
    } else {
        loaded.commit(next)?;
    }
    match policy {
        StageDeletePolicy::Cascade => println!("deleted {} ({} objects removed)", id, removal.removed.len()),
        StageDeletePolicy::Detach => println!("deleted {} ({} objects detached)", id, removal.detached.len()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

pub(super) fn cmd_objects(ctx: &Ctx, args: ObjectsArgs) -> CmdResult {
    let changes_filter = args.reset || args.stage.is_some() || args.delivery.is_some() || args.status.is_some();
    let mut loaded = if changes_filter {
        ctx.load_for_write()?
    } else {
        ctx.load()?
    };

    let mut filter = if args.reset {
        ObjectFilter::default()
    } else {
        loaded.state.filter.clone()
    };
    if let Some(stage) = &args.stage {
        filter.stage = StageFilter::parse(stage);
    }
    if let Some(delivery) = &args.delivery {
        filter.delivery = DeliveryFilter::parse(delivery)?;
    }
    if let Some(status) = &args.status {
        filter.status = StatusCategory::parse(status)?;
    }
    if filter != loaded.state.filter {
        loaded.state.filter = filter.clone();
        loaded.save_state()?;
    }

    let registry = loaded.registry();
    let project = loaded.project(args.scope.project.as_deref())?;
    let visible = filter_objects(&project.objects, &filter);

    if ctx.json {
        let out: Vec<_> = visible
            .iter()
            .map(|o| object_to_json(project, o, &loaded.state.selection, &registry))
            .collect();
        return print_json(&out);
    }
    if !filter.is_unfiltered() {
        println!(
            "filter: stage={} delivery={} status={} ({} of {})",
            filter.stage,
            filter.delivery,
            filter.status,
            visible.len(),
            project.objects.len()
        );
    }
    if visible.is_empty() {
        println!("no objects");
    } else {
        let layout = ColumnLayout::from_config(&loaded.ws.config.columns)
            .map_err(|e| format!("invalid [columns] in config.toml: {}", e))?;
        print_lines(&format_objects(project, &visible, &loaded.state.selection, &registry, &layout));
    }
    Ok(())
}

pub(super) fn cmd_object(ctx: &Ctx, cmd: ObjectCmd) -> CmdResult {
    match cmd.action {
        ObjectAction::Add(args) => object_add(ctx, args),
        ObjectAction::Edit(args) => object_edit(ctx, args),
        ObjectAction::Rm(args) => object_rm(ctx, args),
        ObjectAction::Show(args) => object_show(ctx, args),
        ObjectAction::Violation(cmd) => object_violation(ctx, cmd),
    }
}

/// Overlay the flags that were given onto `object`
fn apply_fields(object: &mut ProjectObject, f: ObjectFields, registry: &StatusRegistry) -> Result<(), String> {
    let text = |target: &mut String, value: Option<String>| {
        if let Some(v) = value {
            *target = v;
        }
    };
    text(&mut object.region, f.region);
    text(&mut object.district, f.district);
    text(&mut object.location, f.location);
    text(&mut object.coordinates, f.coordinates);
    text(&mut object.other_permits, f.other_permits);
    text(&mut object.equipment_number, f.equipment);
    text(&mut object.documentation_url, f.docs_url);
    text(&mut object.messenger_link, f.messenger);
    text(&mut object.notes, f.notes);

    let flag = |target: &mut bool, value: Option<bool>| {
        if let Some(v) = value {
            *target = v;
        }
    };
    flag(&mut object.inspection, f.inspection);
    flag(&mut object.pole_installation_permit, f.pole_permit);
    flag(&mut object.power_connection_permit, f.power_permit);
    flag(&mut object.verification_certificate, f.verification_certificate);
    flag(&mut object.executive_documentation, f.executive_docs);
    flag(&mut object.construction_work, f.construction);
    flag(&mut object.commissioning_work, f.commissioning);
    flag(&mut object.traffic_arrangement, f.traffic);
    flag(&mut object.web_upload, f.web_upload);
    flag(&mut object.violation_recording, f.violation_recording);

    if let Some(quantity) = f.quantity {
        object.quantity = quantity;
    }
    if let Some(tariff) = f.tariff {
        object.tariff_cost = tariff;
    }
    if let Some(codes) = f.violations {
        object.violation_types = codes
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(ws) = f.work_status {
        object.work_status = parse_work_status(&ws, registry)?;
    }
    if let Some(stage) = f.stage {
        object.stage_id = match stage.as_str() {
            "none" | "" => None,
            id => Some(StageId::new(id)),
        };
    }
    if let Some(delivery) = f.delivery {
        object.delivery_stage = match delivery.as_str() {
            "none" | "" => None,
            d => Some(DeliveryStage::parse(d).ok_or_else(|| format!("invalid delivery stage: {} (expected 1-5 or none)", d))?),
        };
    }
    if let Some(op) = f.operator {
        object.operator = Operator::parse(&op).ok_or_else(|| format!("invalid operator: {}", op))?;
    }
    if let Some(ct) = f.connection {
        object.connection_type = ConnectionType::parse(&ct).ok_or_else(|| format!("invalid connection type: {}", ct))?;
    }
    Ok(())
}

fn object_add(ctx: &Ctx, args: ObjectAddArgs) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let registry = loaded.registry();
    let project = loaded.project(args.scope.project.as_deref())?;
    let mut object = ProjectObject::blank(ObjectId::new(""), args.name);
    apply_fields(&mut object, args.fields, &registry)?;
    let (next, id) = object_ops::add_object(project, object)?;
    let next = loaded.portfolio.with_project(next);
    loaded.commit(next)?;
    println!("{}", id);
    Ok(())
}

fn object_edit(ctx: &Ctx, args: ObjectEditArgs) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let registry = loaded.registry();
    let id = ObjectId::new(args.id);
    let project = loaded
        .portfolio
        .project_of_object(&id)
        .ok_or_else(|| format!("object not found: {}", id))?;
    let mut object = project
        .object(&id)
        .cloned()
        .ok_or_else(|| format!("object not found: {}", id))?;
    if let Some(name) = args.name {
        object.name = name;
    }
    apply_fields(&mut object, args.fields, &registry)?;
    let next = object_ops::update_object(project, object)?;
    let next = loaded.portfolio.with_project(next);
    loaded.commit(next)?;
    println!("updated {}", id);
    Ok(())
}

fn object_rm(ctx: &Ctx, args: IdArg) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let id = ObjectId::new(args.id);
    let project = loaded
        .portfolio
        .project_of_object(&id)
        .ok_or_else(|| format!("object not found: {}", id))?;
    let next = object_ops::delete_object(project, &id)?;
    let next = loaded.portfolio.with_project(next);
    loaded.commit(next)?;
    println!("deleted {}", id);
    Ok(())
}

fn object_show(ctx: &Ctx, args: IdArg) -> CmdResult {
    let loaded = ctx.load()?;
    let registry = loaded.registry();
    let id = ObjectId::new(args.id);
    let (project, object) = loaded
        .portfolio
        .project_of_object(&id)
        .and_then(|p| p.object(&id).map(|o| (p, o)))
        .ok_or_else(|| format!("object not found: {}", id))?;
    if ctx.json {
        return print_json(&object_to_json(project, object, &loaded.state.selection, &registry));
    }
    print_lines(&format_object_detail(project, object, &registry));
    Ok(())
}

fn object_violation(ctx: &Ctx, cmd: ViolationCmd) -> CmdResult {
    let (args, add) = match cmd.action {
        ViolationAction::Add(args) => (args, true),
        ViolationAction::Rm(args) => (args, false),
    };
    let mut loaded = ctx.load_for_write()?;
    let id = ObjectId::new(args.id);
    let project = loaded
        .portfolio
        .project_of_object(&id)
        .ok_or_else(|| format!("object not found: {}", id))?;
    let next = if add {
        object_ops::add_violation(project, &id, &args.code)?
    } else {
        object_ops::remove_violation(project, &id, &args.code)?
    };
    let next = loaded.portfolio.with_project(next);
    loaded.commit(next)?;
    println!("{} {} {}", if add { "added" } else { "removed" }, args.code.trim(), id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection and bulk edits
// ---------------------------------------------------------------------------

pub(super) fn cmd_select(ctx: &Ctx, cmd: SelectCmd) -> CmdResult {
    match cmd.action {
        SelectAction::Toggle(args) => {
            let mut loaded = ctx.load_for_write()?;
            for id in args.ids {
                let id = ObjectId::new(id);
                if loaded.portfolio.project_of_object(&id).is_none() {
                    return Err(format!("object not found: {}", id).into());
                }
                let selected = loaded.state.selection.toggle(id.clone());
                println!("{} {}", if selected { "selected" } else { "deselected" }, id);
            }
            loaded.save_state()
        }
        SelectAction::All(scope) => {
            let mut loaded = ctx.load_for_write()?;
            let project = loaded.project(scope.project.as_deref())?.clone();
            let filter = loaded.state.filter.clone();
            match loaded.state.selection.select_all_visible(&project, &filter) {
                VisibleToggle::Selected(n) => println!("selected {} objects", n),
                VisibleToggle::Deselected(n) => println!("deselected {} objects", n),
            }
            loaded.save_state()
        }
        SelectAction::Clear => {
            let mut loaded = ctx.load_for_write()?;
            let n = loaded.state.selection.len();
            loaded.state.selection.clear();
            loaded.save_state()?;
            println!("cleared {} objects", n);
            Ok(())
        }
        SelectAction::Show => {
            let loaded = ctx.load()?;
            let entries: Vec<SelectedJson> = loaded
                .state
                .selection
                .iter()
                .map(|id| {
                    let project = loaded.portfolio.project_of_object(id);
                    SelectedJson {
                        id,
                        project_id: project.map(|p| &p.id),
                        name: project.and_then(|p| p.object(id)).map(|o| o.name.as_str()),
                    }
                })
                .collect();
            if ctx.json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("nothing selected");
            }
            for e in &entries {
                println!(
                    "{}  {}  [{}]",
                    e.id,
                    e.name.unwrap_or("?"),
                    e.project_id.map(|p| p.as_str()).unwrap_or("?")
                );
            }
            Ok(())
        }
    }
}

pub(super) fn cmd_bulk(ctx: &Ctx, cmd: BulkCmd) -> CmdResult {
    let mut loaded = ctx.load_for_write()?;
    let (next, count) = match cmd.action {
        BulkAction::Status(args) => {
            let registry = loaded.registry();
            let status = parse_work_status(&args.status, &registry)?;
            loaded.state.selection.apply_bulk_status(&loaded.portfolio, status)?
        }
        BulkAction::Violations(args) => loaded
            .state
            .selection
            .apply_bulk_violations(&loaded.portfolio, &args.codes[..])?,
    };
    // the bulk edit consumed the selection
    loaded.commit_with_state(next)?;
    println!("updated {} objects", count);
    Ok(())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

pub(super) fn cmd_stats(ctx: &Ctx) -> CmdResult {
    let loaded = ctx.load()?;
    let registry = loaded.registry();
    let stats = project_ops::portfolio_stats(&loaded.portfolio);
    let per_project: Vec<_> = loaded
        .portfolio
        .projects
        .iter()
        .map(|p| (p, project_ops::project_counts(p)))
        .collect();
    if ctx.json {
        let out = StatsJson {
            portfolio: &stats,
            projects: per_project.iter().map(|(p, c)| counts_to_json(p, c)).collect(),
        };
        return print_json(&out);
    }
    print_lines(&format_stats(&stats, &per_project, &registry));
    Ok(())
}

pub(super) fn cmd_check(ctx: &Ctx) -> CmdResult {
    let loaded = ctx.load()?;
    let result = check::check_portfolio(&loaded.portfolio);
    if ctx.json {
        return print_json(&result);
    }
    print_lines(&format_check(&result));
    Ok(())
}

pub(super) fn cmd_violations(ctx: &Ctx) -> CmdResult {
    if ctx.json {
        return print_json(VIOLATION_CATALOG);
    }
    for v in VIOLATION_CATALOG {
        println!("{:<10} {}", v.code, v.description);
    }
    Ok(())
}
