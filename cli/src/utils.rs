use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

/// All `*.json` files below `dir`, as absolute paths. Entries are visited
/// in file-name order so repeated runs see the same sequence. Dot-files and
/// dot-directories (editor backups, `.ipynb_checkpoints`) are skipped.
pub fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("input directory not found: {}", dir.display());
    }

    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && has_json_extension(entry.path()) {
            let path = std::path::absolute(entry.path())
                .with_context(|| format!("failed to resolve {}", entry.path().display()))?;
            files.push(path);
        }
    }

    Ok(files)
}

/// Parse every non-blank line of `path` as one `T`.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .with_context(|| format!("malformed record at {}:{}", path.display(), idx + 1))?;
        records.push(record);
    }

    Ok(records)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
