//! redb table definitions for the embedded store.
//!
//! Each table uses `&str` keys and `&[u8]` values. Set membership is
//! encoded as composite `{set}:{member}` keys in the SETS table and
//! recovered by prefix scan.

use redb::TableDefinition;

/// Opaque values keyed by caller-supplied key.
pub const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Counter cells (JSON `{count, expires_at_ms}`) keyed by counter key.
pub const COUNTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("counters");

/// Set membership keyed by `{set}:{member}`, empty values.
pub const SETS: TableDefinition<&str, &[u8]> = TableDefinition::new("sets");
