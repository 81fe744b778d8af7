use anyhow::{bail, Context, Result};
use jobrank_core::JobPosting;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read postings from a JSON/JSONL file, or every such file under a directory.
/// Files are visited in path order. Duplicate ids are rejected.
pub fn read_postings(input: impl AsRef<Path>) -> Result<Vec<JobPosting>> {
    let input = input.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }

    let mut postings = Vec::new();
    for file in &files {
        let before = postings.len();
        if extension(file) == Some("jsonl") {
            read_jsonl(file, &mut postings)?;
        } else {
            read_json(file, &mut postings)?;
        }
        tracing::debug!(file = %file.display(), count = postings.len() - before, "read postings");
    }

    let mut seen = HashSet::new();
    for p in &postings {
        if !seen.insert(p.id) {
            bail!("duplicate posting id {}", p.id);
        }
    }
    tracing::info!(files = files.len(), postings = postings.len(), "collected postings");
    Ok(postings)
}

fn extension(p: &Path) -> Option<&str> { p.extension().and_then(|s| s.to_str()) }

fn read_jsonl(file: &Path, out: &mut Vec<JobPosting>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let posting = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid posting", file.display(), lineno + 1))?;
        out.push(posting);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<JobPosting>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v).with_context(|| format!("{}: invalid posting", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            out.push(serde_json::from_value(json).with_context(|| format!("{}: invalid posting", file.display()))?);
        }
        _ => bail!("{}: expected an object or array of postings", file.display()),
    }
    Ok(())
}
