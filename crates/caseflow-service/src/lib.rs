//! Caseflow service flows.
//!
//! Coordination logic over the repository traits defined in caseflow-core:
//! participant resolution and enrichment, term and definition upserts, and
//! entity recalculation for signal instances. Flows hold `Arc<dyn Trait>`
//! repositories so they run unchanged against PostgreSQL or the in-memory
//! mocks.

pub mod entity_extraction;
pub mod entity_recalculation;
pub mod mock;
pub mod participant_resolver;
pub mod plugins;
pub mod term_flows;

pub use entity_extraction::find_entities;
pub use entity_recalculation::{EntityRecalculator, LogOnlyDispatcher};
pub use participant_resolver::ParticipantResolver;
pub use plugins::PluginRegistry;
pub use term_flows::TermFlows;
