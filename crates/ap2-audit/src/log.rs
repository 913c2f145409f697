use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::AuditRecord;

/// One position in the log: the record plus its chain metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Zero-based position in the session log.
    pub seq: u64,
    pub record: AuditRecord,
    /// `hash_self` of the previous entry; `None` for the first entry or when
    /// chaining is off.
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Session-scoped, append-only audit log.
///
/// There is no removal or reordering API. The only way to clear it is to
/// drop it (session reset reconstructs a fresh log).
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    hash_chain: bool,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuditLog {
    pub fn new(hash_chain: bool) -> Self {
        Self {
            entries: Vec::new(),
            hash_chain,
        }
    }

    pub fn hash_chain(&self) -> bool {
        self.hash_chain
    }

    /// Append one record at the end of the log.
    ///
    /// Fails only if the entry cannot be serialized for hashing; the log is
    /// left unchanged in that case.
    pub fn append(&mut self, record: AuditRecord) -> Result<&AuditEntry> {
        let hash_prev = if self.hash_chain {
            self.last_hash().map(str::to_string)
        } else {
            None
        };
        let mut entry = AuditEntry {
            seq: self.entries.len() as u64,
            record,
            hash_prev,
            hash_self: None,
        };
        if self.hash_chain {
            entry.hash_self = Some(compute_entry_hash(&entry)?);
        }

        self.entries.push(entry);
        let idx = self.entries.len() - 1;
        Ok(&self.entries[idx])
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &AuditRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Event names in log order, e.g. `["MANDATE_ISSUED", "REGISTERED"]`.
    pub fn events(&self) -> Vec<&'static str> {
        self.records().map(AuditRecord::event).collect()
    }

    pub fn last(&self) -> Option<&AuditRecord> {
        self.entries.last().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Head of the chain.
    pub fn last_hash(&self) -> Option<&str> {
        self.entries.last().and_then(|e| e.hash_self.as_deref())
    }

    /// Render as JSON Lines, one canonical entry per line.
    pub fn to_jsonl(&self) -> Result<String> {
        self.entries.iter().try_fold(String::new(), |mut out, e| {
            out.push_str(&canonical_json(e)?);
            out.push('\n');
            Ok(out)
        })
    }

    /// Write the whole log to `path`, creating parent directories and
    /// replacing any existing file.
    pub fn export_jsonl(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("create audit export dir {:?}", dir))?;
        }
        fs::write(path, self.to_jsonl()?).with_context(|| format!("write audit export {:?}", path))
    }

    /// Re-check the in-memory chain.
    pub fn verify(&self) -> Result<VerifyResult> {
        verify_hash_chain_str(&self.to_jsonl()?)
    }
}

/// Compact JSON with object keys in sorted order.
///
/// `serde_json::Map` is a `BTreeMap` unless `preserve_order` is enabled, so
/// going through `Value` is enough to fix key order.
fn canonical_json<T: Serialize>(v: &T) -> Result<String> {
    let value = serde_json::to_value(v).context("serialize audit entry")?;
    serde_json::to_string(&value).context("render audit entry")
}

/// SHA-256 (hex) over the canonical JSON of `entry` with `hash_self` cleared.
pub fn compute_entry_hash(entry: &AuditEntry) -> Result<String> {
    let unsealed = AuditEntry {
        hash_self: None,
        ..entry.clone()
    };
    let canonical = canonical_json(&unsealed)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Outcome of checking an exported log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Every entry is sealed and the chain links end to end.
    Valid { lines: usize },
    /// No entry carries a hash, so content cannot be vouched for. Only
    /// ordering (`seq`) was checked.
    Unchained { lines: usize },
    /// `line` is 1-based, counting every physical line of the input.
    Broken { line: usize, reason: String },
}

/// Verify the hash chain of an exported JSONL file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("read audit export {:?}", path))?;
    verify_hash_chain_str(&content)
}

/// Same as [`verify_hash_chain`] over in-memory JSONL content.
///
/// The first entry fixes the mode: if it carries `hash_self`, every entry
/// must. Per non-blank line, in order: `seq` equals the entry's position,
/// `hash_prev` equals the previous entry's `hash_self`, and `hash_self`
/// recomputes. The first violation is reported. Unparseable lines are an
/// error, not a `Broken` result.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut chained: Option<bool> = None;
    let mut expected_prev: Option<String> = None;
    let mut checked = 0usize;

    let lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    for (idx, raw) in lines {
        let line = idx + 1;
        let entry: AuditEntry = serde_json::from_str(raw.trim())
            .with_context(|| format!("audit export line {line} is not an entry"))?;

        let sealed = *chained.get_or_insert(entry.hash_self.is_some());
        let violation = if sealed {
            chain_violation(&entry, checked as u64, expected_prev.as_deref())?
        } else {
            unchained_violation(&entry, checked as u64)
        };
        if let Some(reason) = violation {
            return Ok(VerifyResult::Broken { line, reason });
        }

        checked += 1;
        expected_prev = entry.hash_self;
    }

    Ok(match chained {
        Some(false) => VerifyResult::Unchained { lines: checked },
        _ => VerifyResult::Valid { lines: checked },
    })
}

fn seq_violation(entry: &AuditEntry, expected_seq: u64) -> Option<String> {
    (entry.seq != expected_seq)
        .then(|| format!("seq out of order: expected {expected_seq}, found {}", entry.seq))
}

fn chain_violation(
    entry: &AuditEntry,
    expected_seq: u64,
    expected_prev: Option<&str>,
) -> Result<Option<String>> {
    if let Some(reason) = seq_violation(entry, expected_seq) {
        return Ok(Some(reason));
    }
    if entry.hash_prev.as_deref() != expected_prev {
        return Ok(Some(format!(
            "hash_prev does not link: expected {expected_prev:?}, found {:?}",
            entry.hash_prev
        )));
    }
    let Some(claimed) = &entry.hash_self else {
        return Ok(Some("hash_self missing in chained log".to_string()));
    };
    let actual = compute_entry_hash(entry)?;
    if *claimed != actual {
        return Ok(Some(format!(
            "hash_self mismatch: entry claims {claimed}, content hashes to {actual}"
        )));
    }
    Ok(None)
}

fn unchained_violation(entry: &AuditEntry, expected_seq: u64) -> Option<String> {
    if entry.hash_prev.is_some() || entry.hash_self.is_some() {
        return Some("hash present in unchained log".to_string());
    }
    seq_violation(entry, expected_seq)
}
