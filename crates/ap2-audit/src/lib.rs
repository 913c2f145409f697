//! ap2-audit
//!
//! Audit trail for the mandate workflow.
//!
//! - [`AuditRecord`] is the closed event vocabulary, one variant per event
//!   kind, each carrying its own typed fields.
//! - [`AuditLog`] is the session-scoped, append-only sequence. Entries are
//!   never reordered or deduplicated. With hash chaining on, each entry
//!   carries `hash_prev` + `hash_self` so an exported log can be checked for
//!   tampering.
//! - Export is JSON Lines (one entry per line, canonical key order).

mod log;
mod record;

pub use log::{compute_entry_hash, verify_hash_chain, verify_hash_chain_str, AuditEntry, AuditLog, VerifyResult};
pub use record::{AuditRecord, WorkflowStep};
