//! Structured logging field name constants for caseflow.
//!
//! All crates use these constants so log aggregation tools can query by
//! standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, best-effort side effect failed |
//! | INFO  | Operation completions, record creation |
//! | DEBUG | Decision points (hit/miss paths, plugin resolution) |
//! | TRACE | Per-item iteration (role appends, entity matches) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "db", "service", "plugins"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "participant_resolver", "entity_recalculation", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "get_or_create", "update_or_create_term", "recalculate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Project UUID scoping the operation.
pub const PROJECT_ID: &str = "project_id";

/// Participant UUID being operated on.
pub const PARTICIPANT_ID: &str = "participant_id";

/// Incident UUID.
pub const INCIDENT_ID: &str = "incident_id";

/// Case UUID.
pub const CASE_ID: &str = "case_id";

/// Individual contact UUID.
pub const INDIVIDUAL_ID: &str = "individual_id";

/// On-call service UUID.
pub const SERVICE_ID: &str = "service_id";

/// Role name on a participant role record.
pub const ROLE: &str = "role";

/// Term UUID.
pub const TERM_ID: &str = "term_id";

/// Entity type UUID.
pub const ENTITY_TYPE_ID: &str = "entity_type_id";

/// Signal instance UUID.
pub const SIGNAL_INSTANCE_ID: &str = "signal_instance_id";

/// Plugin capability type being resolved ("contact", ...).
pub const PLUGIN_TYPE: &str = "plugin_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of role records appended in one call.
pub const ROLE_COUNT: &str = "role_count";

/// Number of entities extracted/persisted.
pub const ENTITY_COUNT: &str = "entity_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
