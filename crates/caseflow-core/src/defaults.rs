//! Centralized default constants for the caseflow system.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own strings.

// =============================================================================
// CONTACT ENRICHMENT
// =============================================================================

/// Location assigned when no contact plugin can supply one.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Department assigned when no contact plugin can supply one.
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Capability type under which contact enrichment plugins register.
pub const CONTACT_PLUGIN_TYPE: &str = "contact";

// =============================================================================
// VOCABULARY
// =============================================================================

/// Source recorded on definitions created without an explicit source.
pub const DEFINITION_SOURCE: &str = "caseflow";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints.
pub const PAGE_LIMIT: i64 = 50;
