//! Typed ID definitions for every entity the workers touch.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for export jobs (`export_job` rows).
pub struct ExportJob;

/// Marker type for uploaded resumes (`resume_document` rows).
pub struct ResumeDocument;

/// Marker type for applications linking a candidate to a job posting.
pub struct Application;

/// Marker type for job postings (`job` rows).
pub struct JobPosting;

/// Marker type for candidates. Owned outside this crate.
pub struct Candidate;

/// Marker type for audit log entries.
pub struct AuditEntry;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type ExportJobId = Id<ExportJob>;

pub type ResumeDocumentId = Id<ResumeDocument>;

pub type ApplicationId = Id<Application>;

pub type JobPostingId = Id<JobPosting>;

pub type CandidateId = Id<Candidate>;

pub type AuditEntryId = Id<AuditEntry>;
