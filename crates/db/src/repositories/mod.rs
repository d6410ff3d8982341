//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every tenant-scoped method takes the organization id explicitly; the RLS
//! policies are the backstop, not the only line of defense.

pub mod audit;
pub mod business_case;
pub mod delayed_job;
pub mod department;
pub mod epic;
pub mod notification;
pub mod organization;
pub mod problem;
pub mod project;
pub mod report;
pub mod report_data;
pub mod search;
pub mod user;
pub mod workflow;

pub use audit::AuditRepository;
pub use business_case::{BusinessCaseRepository, CaseError, CreateCaseInput, UpdateCaseInput};
pub use delayed_job::{DelayedJobRepository, JobType};
pub use department::{DepartmentError, DepartmentRepository};
pub use epic::{EpicError, EpicRepository, StoryInput};
pub use notification::{channels_of, NotificationRepository, SettingUpdate};
pub use organization::{OrganizationError, OrganizationRepository};
pub use problem::{CreateProblemInput, ProblemError, ProblemRepository, UpdateProblemInput};
pub use project::{CreateMilestoneInput, CreateProjectInput, ProjectError, ProjectRepository};
pub use report::{ReportError, ReportRepository, UpsertReportTemplateInput};
pub use report_data::ReportDataRepository;
pub use search::{SearchHit, SearchRepository, SearchStats};
pub use user::{UserError, UserRepository};
pub use workflow::{UpsertWorkflowInput, WorkflowRepository, WorkflowRepoError};
