use crate::catalog::{DocumentTypeSpec, RECOGNIZED_EXTENSIONS};
use crate::error::IndexError;
use crate::models::ScannedFile;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A type that came back with fewer files than half its expected count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationWarning {
    pub type_id: String,
    pub label: String,
    pub found: usize,
    pub expected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub type_id: String,
    pub found: usize,
    pub expected: usize,
}

pub struct ScanReport<'a> {
    pub files: Vec<ScannedFile<'a>>,
    pub counts: Vec<TypeCount>,
    pub warnings: Vec<PopulationWarning>,
}

impl ScanReport<'_> {
    pub fn count_for(&self, type_id: &str) -> usize {
        self.counts
            .iter()
            .find(|count| count.type_id == type_id)
            .map(|count| count.found)
            .unwrap_or(0)
    }
}

struct CompiledType<'a> {
    spec: &'a DocumentTypeSpec,
    patterns: GlobSet,
}

fn compile_catalog(catalog: &[DocumentTypeSpec]) -> Result<Vec<CompiledType<'_>>, IndexError> {
    catalog
        .iter()
        .map(|spec| {
            let mut builder = GlobSetBuilder::new();
            for pattern in &spec.patterns {
                let glob = GlobBuilder::new(pattern)
                    .case_insensitive(true)
                    .literal_separator(true)
                    .build()
                    .map_err(|error| IndexError::InvalidPattern {
                        type_id: spec.id.clone(),
                        pattern: pattern.clone(),
                        details: error.to_string(),
                    })?;
                builder.add(glob);
            }
            let patterns = builder.build().map_err(|error| IndexError::InvalidPattern {
                type_id: spec.id.clone(),
                pattern: spec.patterns.join(", "),
                details: error.to_string(),
            })?;
            Ok(CompiledType { spec, patterns })
        })
        .collect()
}

pub fn has_recognized_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            RECOGNIZED_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Relative, `/`-separated form of `path` used for pattern matching.
fn match_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Recognized files under `root`, in sorted order. Unreadable directories
/// are skipped and the walk continues with their siblings.
pub fn discover_candidate_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                debug!(error = %error, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_file() && has_recognized_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort_unstable();
    files
}

/// Walks `root` once and classifies each recognized file into the first
/// catalog type whose patterns match. Files matching no type are dropped.
pub fn scan_corpus<'a>(
    root: &Path,
    catalog: &'a [DocumentTypeSpec],
) -> Result<ScanReport<'a>, IndexError> {
    let compiled = compile_catalog(catalog)?;
    let mut grouped: Vec<Vec<PathBuf>> = vec![Vec::new(); compiled.len()];
    let mut unclassified = 0usize;

    for path in discover_candidate_files(root) {
        let key = match_key(root, &path);
        match compiled.iter().position(|ty| ty.patterns.is_match(&key)) {
            Some(slot) => grouped[slot].push(path),
            None => unclassified += 1,
        }
    }

    if unclassified > 0 {
        debug!(unclassified, "files matched no document type");
    }

    let mut files = Vec::new();
    let mut counts = Vec::with_capacity(compiled.len());
    let mut warnings = Vec::new();

    for (ty, paths) in compiled.iter().zip(grouped) {
        let found = paths.len();
        info!(
            type_id = %ty.spec.id,
            label = %ty.spec.label,
            found,
            expected = ty.spec.expected_count,
            "scanned document type"
        );

        if ty.spec.is_under_populated(found) {
            warn!(
                type_id = %ty.spec.id,
                found,
                expected = ty.spec.expected_count,
                "document type is under-populated"
            );
            warnings.push(PopulationWarning {
                type_id: ty.spec.id.clone(),
                label: ty.spec.label.clone(),
                found,
                expected: ty.spec.expected_count,
            });
        }

        counts.push(TypeCount {
            type_id: ty.spec.id.clone(),
            found,
            expected: ty.spec.expected_count,
        });
        files.extend(paths.into_iter().map(|path| ScannedFile {
            path,
            spec: ty.spec,
        }));
    }

    Ok(ScanReport {
        files,
        counts,
        warnings,
    })
}
