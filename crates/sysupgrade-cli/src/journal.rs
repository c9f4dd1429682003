use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};

/// One recorded phase run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub timestamp_unix: u64,
    pub phase: String,
    pub detail: String,
}

pub fn append_journal_entry(path: &Path, phase: &str, detail: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open upgrade journal: {}", path.display()))?;
    file.write_all(
        format!(
            "ts={}\tphase={phase}\tdetail={detail}\n",
            current_unix_timestamp()?
        )
        .as_bytes(),
    )
    .with_context(|| format!("failed to append upgrade journal: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush upgrade journal: {}", path.display()))?;
    Ok(())
}

pub fn read_journal_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read upgrade journal: {}", path.display()));
        }
    };

    let mut entries = Vec::new();
    for line in raw.lines().filter(|line| !line.trim().is_empty()) {
        let entry = parse_journal_line(line)
            .with_context(|| format!("failed parsing upgrade journal: {}", path.display()))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn parse_journal_line(line: &str) -> Result<JournalEntry> {
    let mut timestamp_unix = None;
    let mut phase = None;
    let mut detail = None;

    for field in line.split('\t') {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid journal field: {field}"))?;
        match key {
            "ts" => {
                timestamp_unix =
                    Some(value.parse::<u64>().context("journal ts must be u64")?);
            }
            "phase" => phase = Some(value.to_string()),
            "detail" => detail = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(JournalEntry {
        timestamp_unix: timestamp_unix.context("missing journal field: ts")?,
        phase: phase.context("missing journal field: phase")?,
        detail: detail.context("missing journal field: detail")?,
    })
}

pub fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
