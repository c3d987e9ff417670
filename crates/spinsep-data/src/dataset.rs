//! Data directory discovery.
//!
//! Experiment files are laid out as `<root>/<label>/<name>.json`, where
//! `label` is the interaction strength the runs in that directory share
//! (`0.0`, `1.0`, ...).

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{DataError, DataResult};
use crate::experiment::ExperimentResult;

/// All experiments sharing one directory label.
#[derive(Debug, Clone)]
pub struct DatasetGroup {
    /// Directory name, usually the interaction strength.
    pub label: String,
    /// Records in file-name order.
    pub experiments: Vec<ExperimentResult>,
}

impl DatasetGroup {
    /// The label parsed as a number, if it is one.
    pub fn numeric_label(&self) -> Option<f64> {
        self.label.parse().ok()
    }
}

/// Experiments discovered under a data root.
#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
    groups: Vec<DatasetGroup>,
}

impl Dataset {
    /// Directory the dataset was read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Groups ordered by label.
    pub fn groups(&self) -> &[DatasetGroup] {
        &self.groups
    }

    /// Consume the dataset, yielding its groups.
    pub fn into_groups(self) -> Vec<DatasetGroup> {
        self.groups
    }

    /// Group with the given label.
    pub fn get(&self, label: &str) -> Option<&DatasetGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    /// Labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.label.as_str()).collect()
    }

    /// Total number of experiment records.
    pub fn experiments_count(&self) -> usize {
        self.groups.iter().map(|g| g.experiments.len()).sum()
    }

    /// True if no group holds any record.
    pub fn is_empty(&self) -> bool {
        self.experiments_count() == 0
    }
}

/// Numeric labels first, in value order; everything else lexically after.
fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then(a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn sorted_entries(dir: &Path) -> DataResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| DataError::io(dir, e))? {
        let entry = entry.map_err(|e| DataError::io(dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Load every `<root>/<label>/*.json` record.
///
/// Any unreadable or invalid file aborts the whole load.
pub fn load_dataset(root: &Path) -> DataResult<Dataset> {
    if !root.is_dir() {
        return Err(DataError::MissingDataDirectory(root.to_path_buf()));
    }

    let mut groups = Vec::new();
    for dir in sorted_entries(root)? {
        if !dir.is_dir() {
            continue;
        }
        let Some(label) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        let mut experiments = Vec::new();
        for file in sorted_entries(&dir)? {
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            experiments.push(ExperimentResult::load(&file)?);
        }
        debug!(label = %label, experiments = experiments.len(), "loaded group");
        groups.push(DatasetGroup { label, experiments });
    }
    groups.sort_by(|a, b| compare_labels(&a.label, &b.label));

    let dataset = Dataset {
        root: root.to_path_buf(),
        groups,
    };
    info!(
        "Loaded {} experiments in {} groups from {}",
        dataset.experiments_count(),
        dataset.groups.len(),
        root.display()
    );
    Ok(dataset)
}

/// Write records to `<root>/<label>/<name>.json`, creating directories.
pub fn save_group(root: &Path, label: &str, experiments: &[ExperimentResult]) -> DataResult<()> {
    let dir = root.join(label);
    std::fs::create_dir_all(&dir).map_err(|e| DataError::io(&dir, e))?;
    for experiment in experiments {
        experiment.save(&dir.join(format!("{}.json", experiment.name)))?;
    }
    Ok(())
}

/// Partition records into physics-equivalent groups, keeping first-seen order.
pub fn group_compatible(results: Vec<ExperimentResult>) -> Vec<Vec<ExperimentResult>> {
    let mut groups: Vec<Vec<ExperimentResult>> = Vec::new();
    for result in results {
        match groups
            .iter_mut()
            .find(|g| g[0].parameters.physics_equivalent(&result.parameters))
        {
            Some(group) => group.push(result),
            None => groups.push(vec![result]),
        }
    }
    groups
}
