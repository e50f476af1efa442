//! Field-mapping declarations.
//!
//! Mappings are static configuration data: each registry field names the
//! event source it is fed from and a regex pair selecting category and
//! parameter. They are declared per instrument in `pdms-aggregate` and
//! compiled once at startup; nothing mutates them at runtime.

/// One `(target field, source, category pattern, parameter pattern)` row.
///
/// Patterns are regular expressions matched case-insensitively against the
/// event's `category`/`parameter`. A category pattern of `".*"` means
/// "match any category".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// Name of the instrument-record field this mapping populates.
    pub target: &'static str,
    /// Source-type selector, matched as a case-insensitive substring of
    /// the event's `source_type`.
    pub source: &'static str,
    pub category: &'static str,
    pub parameter: &'static str,
}

impl FieldMapping {
    pub const fn new(
        target: &'static str,
        source: &'static str,
        category: &'static str,
        parameter: &'static str,
    ) -> Self {
        Self {
            target,
            source,
            category,
            parameter,
        }
    }
}
