use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::{write::GzEncoder, Compression};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::PathsConfig;

const COMPRESSIBLE: [&str; 8] = ["css", "js", "html", "svg", "txt", "json", "map", "xml"];

#[derive(Debug, Error)]
pub enum StaticError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> StaticError + '_ {
    move |source| StaticError::Io { path: path.to_path_buf(), source }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectReport {
    pub copied: usize,
    pub skipped: usize,
    pub compressed: usize,
}

fn compressible(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| COMPRESSIBLE.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Copies every source directory into `static_root`, keeping relative paths.
/// When two directories provide the same path the earlier one wins.
pub fn collect_static(paths: &PathsConfig) -> Result<CollectReport, StaticError> {
    collect(&paths.static_dirs, &paths.static_root, paths.compress_static)
}

pub fn collect(sources: &[PathBuf], root: &Path, compress: bool) -> Result<CollectReport, StaticError> {
    fs::create_dir_all(root).map_err(io_at(root))?;
    let mut report = CollectReport::default();
    let mut claimed = std::collections::HashSet::new();

    for source in sources {
        if !source.is_dir() {
            warn!(dir = %source.display(), "static source directory missing, skipping");
            continue;
        }
        for entry in WalkDir::new(source).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            if !claimed.insert(relative.to_path_buf()) {
                report.skipped += 1;
                continue;
            }

            let dest = root.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(io_at(parent))?;
            }
            fs::copy(entry.path(), &dest).map_err(io_at(&dest))?;
            report.copied += 1;

            if compress && compressible(&dest) {
                gzip_sibling(&dest)?;
                report.compressed += 1;
            }
        }
    }

    info!(
        copied = report.copied,
        skipped = report.skipped,
        compressed = report.compressed,
        root = %root.display(),
        "static files collected"
    );
    Ok(report)
}

fn gzip_sibling(file: &Path) -> Result<(), StaticError> {
    let mut name = file.as_os_str().to_owned();
    name.push(".gz");
    let target = PathBuf::from(name);

    let data = fs::read(file).map_err(io_at(file))?;
    let out = fs::File::create(&target).map_err(io_at(&target))?;
    let mut encoder = GzEncoder::new(out, Compression::best());
    encoder.write_all(&data).map_err(io_at(&target))?;
    encoder.finish().map_err(io_at(&target))?;
    Ok(())
}
