use std::io::Cursor;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sitemon::model::ids::{ObjectId, ProjectId, StageId};
use sitemon::model::object::{ConnectionType, DeliveryStage, Operator, ProjectObject, WorkStatus};
use sitemon::model::project::{Project, ProjectHealth, ProjectKind};
use sitemon::model::stage::{Stage, StageStatus};
use sitemon::model::status::StatusRegistry;
use sitemon::sheet::{Column, Cell, export_to_buffer, merge_rows, read_rows};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

/// A project whose objects exercise every column kind
fn project() -> Project {
    let mut pole = ProjectObject::blank(ObjectId::new("o-1"), "Опора №7");
    pole.region = "Московская область".into();
    pole.district = "Одинцовский".into();
    pole.coordinates = "55.6789° N, 37.2833° E".into();
    pole.inspection = true;
    pole.pole_installation_permit = true;
    pole.equipment_number = "КД-2041".into();
    pole.quantity = 3;
    pole.construction_work = true;
    pole.violation_types = vec!["12.9 ч.2".into(), "12.16 ч.1".into()];
    pole.documentation_url = "https://example.org/docs/7".into();
    pole.work_status = WorkStatus::Paused;
    pole.stage_id = Some(StageId::new("s-1"));
    pole.delivery_stage = DeliveryStage::new(2);
    pole.operator = Operator::Megafon;
    pole.connection_type = ConnectionType::Optical;
    pole.tariff_cost = 1250.5;

    let mut camera = ProjectObject::blank(ObjectId::new("o-2"), "Камера на въезде");
    camera.notes = "Ждём подключения".into();
    camera.work_status = WorkStatus::Completed;

    Project {
        id: ProjectId::new("p-1"),
        name: "Трасса М-1".into(),
        kind: ProjectKind::Road,
        progress: 30,
        budget: 90_000_000.0,
        spent: 12_000_000.0,
        status: ProjectHealth::AtRisk,
        start_date: date(1, 10),
        end_date: date(12, 20),
        stages: vec![Stage {
            id: StageId::new("s-1"),
            name: "Монтаж".into(),
            progress: 40,
            start_date: date(2, 1),
            end_date: date(6, 1),
            status: StageStatus::InProgress,
        }],
        objects: vec![pole, camera],
    }
}

#[test]
fn export_then_import_changes_nothing() {
    let registry = StatusRegistry::default();
    let project = project();
    let objects: Vec<&ProjectObject> = project.objects.iter().collect();

    let bytes = export_to_buffer(&project, &objects, &registry).unwrap();
    let rows = read_rows(Cursor::new(bytes)).unwrap();
    assert_eq!(rows.len(), 2);

    let outcome = merge_rows(&project, &rows, &registry);
    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.created, 0);
    assert_eq!(outcome.project, project);
}

#[test]
fn rows_with_foreign_ids_become_new_objects() {
    let registry = StatusRegistry::default();
    let project = project();
    let objects: Vec<&ProjectObject> = project.objects.iter().collect();

    let bytes = export_to_buffer(&project, &objects, &registry).unwrap();
    let mut rows = read_rows(Cursor::new(bytes)).unwrap();
    rows[1].insert(Column::Id, Cell::Text("from-another-workspace".into()));

    let outcome = merge_rows(&project, &rows, &registry);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.created, 1);
    assert_eq!(outcome.project.objects.len(), 3);

    let copy = &outcome.project.objects[2];
    assert_ne!(copy.id, "from-another-workspace");
    assert_eq!(copy.name, "Камера на въезде");
    // new objects take their status from the label, but never a stage
    assert_eq!(copy.work_status, WorkStatus::Completed);
    assert!(copy.stage_id.is_none());
}

#[test]
fn relabelled_statuses_survive_the_trip() {
    let mut registry = StatusRegistry::default();
    let mut options = registry.options().to_vec();
    options[3].label = "Сдано".into();
    registry.set_options(options).unwrap();

    let project = project();
    let objects: Vec<&ProjectObject> = project.objects.iter().collect();
    let bytes = export_to_buffer(&project, &objects, &registry).unwrap();
    let mut rows = read_rows(Cursor::new(bytes)).unwrap();
    assert_eq!(rows[1].get(&Column::WorkStatus), Some(&Cell::Text("Сдано".into())));

    rows[1].shift_remove(&Column::Id);
    let outcome = merge_rows(&project, &rows, &registry);
    assert_eq!(outcome.project.objects[2].work_status, WorkStatus::Completed);
}

#[test]
fn padded_text_survives_the_trip() {
    let registry = StatusRegistry::default();
    let mut project = project();
    project.objects[0].name = "Опора ".into();
    project.objects[1].notes = "  отступ".into();
    let objects: Vec<&ProjectObject> = project.objects.iter().collect();

    let bytes = export_to_buffer(&project, &objects, &registry).unwrap();
    let rows = read_rows(Cursor::new(bytes)).unwrap();

    let outcome = merge_rows(&project, &rows, &registry);
    assert_eq!(outcome.project.objects[0].name, "Опора ");
    assert_eq!(outcome.project.objects[1].notes, "  отступ");
    assert_eq!(outcome.project, project);
}
