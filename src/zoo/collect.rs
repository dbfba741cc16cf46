use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::parse::{parse_class_list, parse_theorem_list};
use super::registry::{ClassMetadata, ClassRegistry};
use super::theorem::Theorem;

/// Counts of what a load accepted and dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub classes_loaded: usize,
    pub classes_skipped: usize,
    pub theorems_loaded: usize,
    pub theorems_skipped: usize,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.classes_skipped + self.theorems_skipped
    }
}

/// Reads both data files and builds a registry. Only unreadable or undecodable files are fatal.
pub fn load_network(classes_path: &Path, theorems_path: &Path) -> Result<(ClassRegistry, LoadReport)> {
    let classes_raw = fs::read_to_string(classes_path)
        .with_context(|| format!("failed to read class list {}", classes_path.display()))?;
    let theorems_raw = fs::read_to_string(theorems_path)
        .with_context(|| format!("failed to read theorem list {}", theorems_path.display()))?;

    build_registry(&classes_raw, &theorems_raw)
}

pub fn build_registry(classes_raw: &str, theorems_raw: &str) -> Result<(ClassRegistry, LoadReport)> {
    let (classes, malformed_classes) =
        parse_class_list(classes_raw).context("failed to parse class list")?;
    let (theorems, malformed_theorems) =
        parse_theorem_list(theorems_raw).context("failed to parse theorem list")?;

    let mut registry = ClassRegistry::new();
    let mut report = load_classes(&mut registry, classes);
    let theorem_report = load_theorems(&mut registry, theorems);

    report.classes_skipped += malformed_classes;
    report.theorems_loaded = theorem_report.theorems_loaded;
    report.theorems_skipped = theorem_report.theorems_skipped + malformed_theorems;

    info!(
        classes = report.classes_loaded,
        theorems = report.theorems_loaded,
        skipped = report.skipped(),
        "complexity network loaded"
    );

    Ok((registry, report))
}

/// Adds every class, dropping invalid records with a warning.
pub fn load_classes(
    registry: &mut ClassRegistry,
    classes: impl IntoIterator<Item = (String, ClassMetadata)>,
) -> LoadReport {
    let mut report = LoadReport::default();
    for (id, metadata) in classes {
        match registry.add_class(&id, metadata) {
            Ok(()) => report.classes_loaded += 1,
            Err(error) => {
                warn!(class = %id, %error, "dropping class");
                report.classes_skipped += 1;
            }
        }
    }
    report
}

/// Adds theorems in order, dropping the ones that reference unknown classes or contradict earlier ones.
pub fn load_theorems(
    registry: &mut ClassRegistry,
    theorems: impl IntoIterator<Item = Theorem>,
) -> LoadReport {
    let mut report = LoadReport::default();
    for theorem in theorems {
        match registry.add_theorem(theorem.clone()) {
            Ok(()) => report.theorems_loaded += 1,
            Err(error) => {
                warn!(kind = theorem.kind(), %error, "dropping theorem");
                report.theorems_skipped += 1;
            }
        }
    }
    report
}
