//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Noema engine.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Suffix appended to a directed edge type's name to form its opposite.
pub const OPPOSITE_SUFFIX: &str = "-opp";

/// Option key holding the transitive flag of an edge type.
pub const TRANSITIVE_OPTION: &str = "transitive";

/// Vertex option key marking an `exact` matcher as a cross-vertex reference.
pub const MATCH_REF_OPTION: &str = "matchRef";

/// Reserved identifier under which store settings are persisted.
///
/// Caller-supplied identifiers may not start with `RESERVED_PREFIX`.
pub const SETTINGS_ID: &str = "_settings";

/// Prefix reserved for internal records.
pub const RESERVED_PREFIX: char = '_';

/// First identifier handed out by a fresh store.
pub const FIRST_ID: &str = "1";

/// Digits used by the identifier allocator (lower-case base 36).
pub const ID_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Maximum identifier length accepted at the store boundary.
///
/// Keeps sharded file paths and database keys bounded.
pub const MAX_ID_LENGTH: usize = 128;
