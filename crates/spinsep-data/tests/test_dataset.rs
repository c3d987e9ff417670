//! Filesystem tests for experiment records and data directories.

use std::path::Path;

use spinsep_data::{
    ChainInitialState, Counts, DataError, ExperimentResult, FermiHubbardParameters, Hamiltonian,
    IndependentChainsInitialState, Layout, TrotterRun, group_compatible, load_dataset, save_group,
};

fn experiment(name: &str, u: f64, layout: Layout) -> ExperimentResult {
    let params = FermiHubbardParameters::new(
        Hamiltonian::new(3, 1.0, u),
        IndependentChainsInitialState::new(
            ChainInitialState::FixedSingleParticle { site: 0 },
            ChainInitialState::UniformSingleParticle,
        ),
        layout,
        0.3,
    );
    let runs = (0..3)
        .map(|step| {
            let mut counts = Counts::new();
            counts.add("100010", 60 + step as u64);
            counts.add("010001", 40);
            TrotterRun::new(step, counts)
        })
        .collect();
    ExperimentResult::new(name, params, runs)
}

// ---------------------------------------------------------------------------
// Single records
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_preserves_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exp.json");
    let mut original = experiment("exp", 2.0, Layout::line(3, [1, 2]));
    original.processor = Some("weber".into());
    original.runs[1].end_timestamp = Some(
        chrono::DateTime::parse_from_rfc3339("2021-03-04T05:06:07.123456Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    );

    original.save(&path).unwrap();
    let loaded = ExperimentResult::load(&path).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn saving_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    let original = experiment("exp", 2.0, Layout::line(3, [0, 0]));

    original.save(&a).unwrap();
    ExperimentResult::load(&a).unwrap().save(&b).unwrap();
    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

#[test]
fn missing_file_is_io_error() {
    let err = ExperimentResult::load(Path::new("/no/such/file.json")).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
}

#[test]
fn malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"name\": ").unwrap();
    let err = ExperimentResult::load(&path).unwrap_err();
    assert!(matches!(err, DataError::Parse { .. }));
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[test]
fn dataset_groups_by_directory_label() {
    let dir = tempfile::tempdir().unwrap();
    save_group(
        dir.path(),
        "4.0",
        &[experiment("a", 4.0, Layout::line(3, [0, 0]))],
    )
    .unwrap();
    save_group(
        dir.path(),
        "0.0",
        &[
            experiment("b", 0.0, Layout::line(3, [0, 0])),
            experiment("a", 0.0, Layout::line(3, [2, 0])),
        ],
    )
    .unwrap();
    std::fs::write(dir.path().join("README.txt"), "not a group").unwrap();

    let dataset = load_dataset(dir.path()).unwrap();
    assert_eq!(dataset.labels(), vec!["0.0", "4.0"]);
    assert_eq!(dataset.experiments_count(), 3);

    let zero = dataset.get("0.0").unwrap();
    assert_eq!(zero.numeric_label(), Some(0.0));
    // Files are read in name order.
    assert_eq!(zero.experiments[0].name, "a");
    assert_eq!(zero.experiments[1].name, "b");
}

#[test]
fn one_bad_file_fails_the_whole_dataset() {
    let dir = tempfile::tempdir().unwrap();
    save_group(
        dir.path(),
        "1.0",
        &[experiment("ok", 1.0, Layout::line(3, [0, 0]))],
    )
    .unwrap();
    std::fs::write(dir.path().join("1.0").join("bad.json"), "[]").unwrap();
    assert!(load_dataset(dir.path()).is_err());
}

#[test]
fn compatible_grouping_ignores_layout() {
    let results = vec![
        experiment("a", 1.0, Layout::line(3, [0, 0])),
        experiment("b", 2.0, Layout::line(3, [0, 0])),
        experiment("c", 1.0, Layout::zigzag(3, [1, 1])),
    ];
    let groups = group_compatible(results);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[0][1].name, "c");
    assert_eq!(groups[1][0].name, "b");
}
