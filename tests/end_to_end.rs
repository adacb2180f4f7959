use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rusty_strata::config::{DatasetSchema, ViewerConfig};
use rusty_strata::data::loader::load_file;
use rusty_strata::data::model::{Dataset, Record};
use rusty_strata::density::{estimate, normalize_to_peak};
use rusty_strata::navigation::{NavigationLevel, NavigationMachine, Transition};
use rusty_strata::selection::Emphasis;
use rusty_strata::state::{AppState, Interaction};

/// A: 5 records (3 with secondary "s"), B: 2, C: 1.
fn abc_dataset() -> Dataset {
    let mut records = Vec::new();
    for i in 0..5 {
        let secondary = if i < 3 { "s" } else { "None" };
        records.push(
            Record::new(&format!("a{i}"), "A", secondary)
                .with_ordinal(1 + (i % 2) as i64)
                .with_value("hp", 40.0 + i as f64 * 10.0),
        );
    }
    records.push(Record::new("b0", "B", "s").with_ordinal(1).with_value("hp", 55.0));
    records.push(Record::new("b1", "B", "None").with_ordinal(2).with_value("hp", 65.0));
    records.push(Record::new("c0", "C", "t").with_ordinal(2).with_value("hp", 90.0));
    Dataset::from_records(records, vec!["hp".into()], "None").unwrap()
}

#[test]
fn drill_down_from_overview_to_detail_list() {
    let mut nav = NavigationMachine::new(Arc::new(abc_dataset()));

    let order: Vec<&str> = nav.view().groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(order, ["A", "B", "C"]);

    assert_eq!(nav.select_segment("A", Some("s")).unwrap(), Transition::Moved);
    assert_eq!(
        nav.level(),
        &NavigationLevel::PrimaryFiltered { primary: "A".into() }
    );
    assert_eq!(nav.view().groups.len(), 1);
    assert_eq!(nav.view().groups[0].total, 5);

    nav.select_segment("A", Some("s")).unwrap();
    let names: Vec<&str> = nav.view().detail.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["a0", "a1", "a2"]);
    assert!(nav
        .view()
        .detail
        .iter()
        .all(|r| r.primary == "A" && r.secondary == "s"));

    nav.back();
    nav.back();
    assert_eq!(nav.level(), &NavigationLevel::Overview);
}

#[test]
fn stacked_segments_cover_every_member_once() {
    let nav = NavigationMachine::new(Arc::new(abc_dataset()));
    let total: f64 = nav.view().segments.iter().map(|s| s.count()).sum();
    assert_eq!(total, 8.0);
    for seg in &nav.view().segments {
        assert!(seg.upper > seg.lower);
    }
}

#[test]
fn two_equal_observations_peak_at_their_value() {
    let grid = [0.0, 5.0, 10.0, 15.0, 20.0];
    let curve = estimate(&[10.0, 10.0], &grid, 7.0);
    let (peak_x, peak_y) = curve
        .points()
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();
    assert_eq!(peak_x, 10.0);
    assert!((peak_y - 0.75 / 7.0).abs() < 1e-12);
    // Outside the kernel support.
    assert_eq!(curve.points()[0].1, 0.0);

    let normalized = normalize_to_peak(&curve);
    assert!((normalized.max_density().unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn single_observation_gives_empty_curve() {
    let curve = estimate(&[42.0], &[40.0, 42.0, 44.0], 7.0);
    assert!(curve.is_empty());
}

#[test]
fn cross_filter_focus_and_animation_through_app_state() {
    let mut state = AppState::with_media_source(ViewerConfig::default(), None);
    let t0 = Instant::now();
    state.set_dataset(abc_dataset(), t0);

    state.dispatch(
        Interaction::ActiveCategoriesReplaced(BTreeSet::from(["B".to_string()])),
        t0,
    );
    state.dispatch(Interaction::RecordFocused("b1".into()), t0);
    let snap = state.snapshot().unwrap();
    assert_eq!(snap.selection.focus.as_deref(), Some("b1"));
    for (record, emphasis) in &snap.selection.records {
        let expected = if record.name == "b1" {
            Emphasis::Emphasized
        } else {
            Emphasis::Dimmed
        };
        assert_eq!(*emphasis, expected, "{}", record.name);
    }

    // Focus outside the active categories is rejected.
    state.dispatch(Interaction::RecordFocused("a0".into()), t0);
    assert!(state.status_message.is_some());
    assert_eq!(state.snapshot().unwrap().selection.focus.as_deref(), Some("b1"));

    state.dispatch(Interaction::Play, t0);
    let tick = Duration::from_millis(state.config.tick_interval_ms);
    assert!(state.poll(t0 + tick));
    let frame = state.snapshot().unwrap().animation.unwrap();
    assert_eq!(frame.ordinal, 2);
    assert!(state.next_wakeup(t0 + tick).is_none());
}

#[test]
fn parquet_file_loads_into_a_dataset() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("type1", DataType::Utf8, true),
        Field::new("type2", DataType::Utf8, true),
        Field::new("generation", DataType::Int64, true),
        Field::new("hp", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["x", "y", "z"])),
            Arc::new(StringArray::from(vec![Some("Water"), None, Some("Fire")])),
            Arc::new(StringArray::from(vec![Some("Ice"), None, None])),
            Arc::new(Int64Array::from(vec![Some(1), Some(1), None])),
            Arc::new(Float64Array::from(vec![Some(50.0), Some(60.0), None])),
        ],
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.parquet");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let dataset = load_file(
        &path,
        &DatasetSchema {
            dimensions: vec!["hp".into()],
            ..DatasetSchema::default()
        },
    )
    .unwrap();

    // "y" has no primary category and is skipped.
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.get("x").unwrap().secondary, "Ice");
    assert_eq!(dataset.get("z").unwrap().secondary, "None");
    assert_eq!(dataset.get("z").unwrap().ordinal, None);
    assert_eq!(dataset.get("z").unwrap().value("hp"), None);
    assert_eq!(dataset.secondary_domain, ["None", "Ice"]);
}
