//! RankSight client: the presentation-facing façade over the pure core and
//! the IO engine. Hosts construct an [`Orchestrator`], call its intent
//! methods from their event loop, and drive [`Orchestrator::pump`] on a
//! tick to observe job state streams and suggestion cache updates.
mod orchestrator;

pub use orchestrator::Orchestrator;
pub use ranksight_engine::{ConfigError, EngineConfig, FetchSettings};
