//! Domain models shared by the repositories, services and web server.

mod candidate;
mod report;

pub use candidate::{Candidate, CandidateCounts, CandidateDraft, CandidateStatus};
pub use report::{
    AiAttribution, LooseNumber, LossType, Region, Report, ReportCounts, ReportFields, ReportInput,
};
