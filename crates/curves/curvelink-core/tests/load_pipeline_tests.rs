use curvelink_core::{
    AttrRef, CombineMethod, CurveData, CurveError, CurveStore, DataTransform, KeyframeHost,
    LoadOptions, LoadRequest, MatchStrength, MemoryHost, NameMapping, PasteOption, ScratchSpace,
    StoreConfig, TimeRange,
};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn scene() -> MemoryHost {
    MemoryHost::new()
        .with_object("rigA:jaw", &["translateY"])
        .with_object("rigA:brow", &["translateY"])
}

fn store() -> CurveStore {
    let mut data = CurveData::new();
    data.insert_curve("jaw.translateY", vec![0.0, 0.5, 1.0]);
    data.insert_curve("brow.translateY", vec![1.0, 2.0, 3.0]);
    CurveStore::new(data)
}

fn jaw() -> AttrRef {
    AttrRef::new("rigA:jaw", "translateY")
}

fn brow() -> AttrRef {
    AttrRef::new("rigA:brow", "translateY")
}

fn assert_scratch_gone(host: &MemoryHost, space: &ScratchSpace) {
    assert!(!host.namespace_exists(&space.namespace));
    assert!(host.list_objects(&space.prefix()).is_empty());
    assert_eq!(host.curve_count(), 0);
}

fn options(option: &str) -> LoadOptions {
    LoadOptions {
        option: Some(option.to_string()),
        ..LoadOptions::default()
    }
}

#[test]
fn replays_matched_curves_and_cleans_up() -> anyhow::Result<()> {
    let mut host = scene();
    let store = store();
    let request = LoadRequest::new(["rigA:jaw", "rigA:brow"]);

    let report = store.load(&mut host, &request)?;
    assert_eq!(report.applied, vec![jaw(), brow()]);
    assert!(report.skipped.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(report.option, PasteOption::ReplaceCompletely);
    assert_eq!(report.source_time, TimeRange::new(0, 2));
    assert_eq!(report.destination_time, TimeRange::new(0, 2));

    let keys = host.animation(&jaw()).expect("jaw animated");
    let values: Vec<(i64, f64)> = keys.iter().map(|(t, v)| (*t, *v)).collect();
    assert_eq!(values, vec![(0, 0.0), (1, 0.5), (2, 1.0)]);
    approx(host.animation(&brow()).expect("brow animated")[&2], 3.0, 1e-12);

    assert_scratch_gone(&host, &store.config().scratch);
    let undo = host.undo();
    assert_eq!((undo.flushes, undo.opened, undo.closed), (1, 1, 1));
    assert_eq!(host.focus(), Some("MainWindow"));
    Ok(())
}

#[test]
fn no_match_raises_before_any_mutation() {
    let mut host = scene();
    let store = store();

    let err = store
        .load(&mut host, &LoadRequest::new(["rigA:ghost"]))
        .expect_err("nothing to match");
    assert_eq!(err, CurveError::NoMatchFound);
    assert!(err.is_recoverable());

    let undo = host.undo();
    assert_eq!((undo.flushes, undo.opened), (0, 0));
    assert!(host.pastes().is_empty());
    assert_scratch_gone(&host, &store.config().scratch);
}

#[test]
fn unrelated_attributes_do_not_match() {
    let mut host = MemoryHost::new().with_object("rigA:tail", &["curl"]);
    let err = store()
        .load(&mut host, &LoadRequest::new(["rigA:tail"]))
        .expect_err("no related curves");
    assert_eq!(err, CurveError::NoMatchFound);
    assert_eq!(host.undo().opened, 0);
}

#[test]
fn merge_at_start_frame_keeps_surrounding_keys() -> anyhow::Result<()> {
    let mut host = scene();
    host.set_animation(jaw(), &[(0, 5.0), (20, 5.0)]);
    let request = LoadRequest::new(["rigA:jaw"]).with_options(LoadOptions {
        start_frame: Some(10),
        ..options("merge")
    });

    let report = store().load(&mut host, &request)?;
    assert_eq!(report.option, PasteOption::Merge);
    assert_eq!(report.destination_time, TimeRange::new(10, 12));

    let keys = host.animation(&jaw()).expect("jaw animated");
    let times: Vec<i64> = keys.keys().copied().collect();
    assert_eq!(times, vec![0, 10, 11, 12, 20]);
    approx(keys[&11], 0.5, 1e-12);
    Ok(())
}

#[test]
fn current_time_supplies_the_start_frame() -> anyhow::Result<()> {
    let mut host = scene();
    host.set_current_time(30);
    let request = LoadRequest::new(["rigA:brow"]).with_options(LoadOptions {
        current_time: true,
        ..LoadOptions::default()
    });

    let report = store().load(&mut host, &request)?;
    assert_eq!(report.destination_time, TimeRange::new(30, 32));
    let pasted = &host.pastes()[0];
    assert_eq!(pasted.args.time, TimeRange::new(30, 32));
    assert_eq!(pasted.args.source, TimeRange::new(0, 2));
    Ok(())
}

#[test]
fn explicit_start_frame_wins_over_current_time() -> anyhow::Result<()> {
    let mut host = scene();
    host.set_current_time(30);
    let request = LoadRequest::new(["rigA:brow"]).with_options(LoadOptions {
        start_frame: Some(4),
        current_time: true,
        ..LoadOptions::default()
    });
    let report = store().load(&mut host, &request)?;
    assert_eq!(report.destination_time, TimeRange::new(4, 6));
    Ok(())
}

#[test]
fn replace_uses_the_source_window() -> anyhow::Result<()> {
    let mut host = scene();
    host.set_animation(jaw(), &[(100, 9.0), (101, 9.0), (105, 9.0)]);
    let request = LoadRequest::new(["rigA:jaw"]).with_options(LoadOptions {
        start_frame: Some(100),
        source_time: Some(TimeRange::new(1, 2)),
        connect: true,
        ..options("replace")
    });

    let report = store().load(&mut host, &request)?;
    assert_eq!(report.source_time, TimeRange::new(1, 2));
    assert_eq!(report.destination_time, TimeRange::new(100, 101));
    assert!(host.pastes()[0].args.connect);

    let keys = host.animation(&jaw()).expect("jaw animated");
    let values: Vec<(i64, f64)> = keys.iter().map(|(t, v)| (*t, *v)).collect();
    assert_eq!(values, vec![(100, 0.5), (101, 1.0), (105, 9.0)]);
    Ok(())
}

#[test]
fn unknown_paste_option_is_rejected_without_mutation() {
    let mut host = scene();
    let request = LoadRequest::new(["rigA:jaw"]).with_options(options("overwrite"));
    let err = store().load(&mut host, &request).expect_err("bad option");
    assert!(matches!(err, CurveError::InvalidOption { .. }));
    assert_eq!(host.undo().opened, 0);
}

#[test]
fn paste_failure_does_not_stop_remaining_matches() -> anyhow::Result<()> {
    let mut host = scene();
    host.fail_paste_on(jaw());
    let store = store();

    let report = store.load(&mut host, &LoadRequest::new(["rigA:jaw", "rigA:brow"]))?;
    assert_eq!(report.applied, vec![brow()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, jaw());
    assert_scratch_gone(&host, &store.config().scratch);
    Ok(())
}

#[test]
fn host_failure_after_temp_curves_still_cleans_up() {
    let mut host = scene();
    host.fail_operation("insert_keyframe");
    let store = store();
    let request = LoadRequest::new(["rigA:jaw"]).with_options(options("insert"));

    let err = store.load(&mut host, &request).expect_err("boundary keys fail");
    assert!(matches!(err, CurveError::Host { ref operation, .. } if operation == "insert_keyframe"));

    assert_scratch_gone(&host, &store.config().scratch);
    let undo = host.undo();
    assert_eq!((undo.opened, undo.closed), (1, 1));
    assert_eq!(host.focus(), Some("MainWindow"));
}

#[test]
fn leftovers_from_an_interrupted_run_are_swept() -> anyhow::Result<()> {
    let space = ScratchSpace::default();
    let mut host = scene().with_namespace(&space.namespace);
    host.create_curve(&format!("{}CURVE", space.prefix()))?;
    assert_eq!(host.curve_count(), 1);

    store().load(&mut host, &LoadRequest::new(["rigA:jaw"]))?;
    assert_scratch_gone(&host, &space);
    Ok(())
}

#[test]
fn each_store_can_own_its_scratch_namespace() -> anyhow::Result<()> {
    let mut host = scene();
    let config = StoreConfig {
        scratch: ScratchSpace::unique(),
        ..StoreConfig::default()
    };
    let store = store().with_config(config);
    store.load(&mut host, &LoadRequest::new(["rigA:jaw"]))?;
    assert!(host.pastes()[0].curve.starts_with(&store.config().scratch.prefix()));
    assert_scratch_gone(&host, &store.config().scratch);
    Ok(())
}

#[test]
fn namespaces_supply_destination_objects() -> anyhow::Result<()> {
    let mut host = scene();
    let request = LoadRequest::new(Vec::<String>::new()).with_namespaces(["rigZ", "rigA"]);
    let report = store().load(&mut host, &request)?;
    assert_eq!(report.applied.len(), 2);
    Ok(())
}

#[test]
fn missing_namespaces_are_reported() {
    let mut host = scene();
    let request = LoadRequest::new(Vec::<String>::new()).with_namespaces(["rigZ"]);
    let err = store().load(&mut host, &request).expect_err("unknown namespace");
    assert_eq!(
        err,
        CurveError::NamespaceNotFound {
            namespace: "rigZ".to_string()
        }
    );
    assert_eq!(host.undo().opened, 0);
}

#[test]
fn transforms_and_mapping_run_before_matching() -> anyhow::Result<()> {
    let mut data = CurveData::new();
    data.insert_curve("mouth_open", vec![0.0, 1.0, 0.5]);
    data.insert_curve("jaw_drop", vec![0.0, 0.0, 1.0]);
    let store = CurveStore::new(data);

    let mut first = DataTransform::new(CombineMethod::Sum);
    first.insert_pairs("jawOpen", &[("mouth_open", 1.0), ("jaw_drop", 0.5)]);
    let mut second = DataTransform::new(CombineMethod::Max);
    second.insert_pairs("jaw_ctrl.translateY", &[("jawOpen", 2.0)]);
    let mapping: NameMapping = [("jaw_ctrl.translateY", "jaw.translateY")]
        .into_iter()
        .collect();

    let request = LoadRequest::new(["rigA:jaw"])
        .with_transform(0, &first)
        .with_transform(1, &second)
        .with_name_mapping(&mapping);

    let prepared = store.prepare_curves(&request);
    assert_eq!(prepared.keys().collect::<Vec<_>>(), vec!["jaw.translateY"]);
    // The stored data is untouched.
    assert!(store.data().curves().contains_key("mouth_open"));

    let mut host = scene();
    let report = store.load(&mut host, &request)?;
    assert_eq!(report.applied, vec![jaw()]);
    let keys = host.animation(&jaw()).expect("jaw animated");
    approx(keys[&1], 2.0, 1e-12);
    approx(keys[&2], 2.0, 1e-12);
    Ok(())
}

#[test]
fn inverted_source_window_is_rejected_before_mutation() {
    let mut host = scene();
    host.set_animation(jaw(), &[(0, 5.0)]);
    let request = LoadRequest::new(["rigA:jaw"]).with_options(LoadOptions {
        source_time: Some(TimeRange::new(2, 0)),
        ..options("merge")
    });

    let err = store().load(&mut host, &request).expect_err("inverted window");
    assert_eq!(err, CurveError::InvalidTimeRange { start: 2, end: 0 });
    assert!(err.is_recoverable());
    assert_eq!(err.category(), "validation");

    assert_eq!(host.undo().opened, 0);
    assert_eq!(host.curve_count(), 0);
    assert!(host.pastes().is_empty());
    assert_eq!(host.animation(&jaw()).map(|k| k.len()), Some(1));
}

#[test]
fn zero_frame_data_has_nothing_to_apply() -> anyhow::Result<()> {
    let mut data = CurveData::new();
    data.read_csv("jaw.translateY,brow.translateY\n".as_bytes())?;
    assert_eq!(data.total_frames(), 0);
    let store = CurveStore::new(data);

    let mut host = scene();
    host.set_animation(jaw(), &[(0, 5.0), (10, 6.0)]);
    let err = store
        .load(&mut host, &LoadRequest::new(["rigA:jaw", "rigA:brow"]))
        .expect_err("no frames");
    assert_eq!(err, CurveError::NoMatchFound);

    let keys = host.animation(&jaw()).expect("jaw keeps its keys");
    assert_eq!(keys.keys().copied().collect::<Vec<_>>(), vec![0, 10]);
    let undo = host.undo();
    assert_eq!((undo.flushes, undo.opened), (0, 0));
    assert_scratch_gone(&host, &store.config().scratch);
    Ok(())
}

#[test]
fn containment_only_pairing_is_applied() -> anyhow::Result<()> {
    let mut data = CurveData::new();
    data.insert_curve("mouth.open", vec![0.0, 0.25, 1.0]);
    let mut host = MemoryHost::new().with_object("mouth_ctrl", &["open_amount"]);

    let report = CurveStore::new(data).load(&mut host, &LoadRequest::new(["mouth_ctrl"]))?;
    let dst = AttrRef::new("mouth_ctrl", "open_amount");
    assert_eq!(report.applied, vec![dst.clone()]);
    assert_eq!(report.matches[0].strength(), MatchStrength::Fuzzy);
    approx(host.animation(&dst).expect("animated")[&2], 1.0, 1e-12);
    Ok(())
}
