//! PBS integration for pbsrun.
//!
//! Submit, query and cancel jobs via qsub, qstat and qdel.

pub mod gateway;
pub mod qdel;
pub mod qstat;
pub mod qsub;
pub mod types;

pub use gateway::{PbsGateway, Scheduler};
pub use qstat::{find_job, parse_qstat, parse_qstat_line, QueueRow};
pub use qsub::parse_job_id;
pub use types::{job_id_prefix, PbsJobState};
