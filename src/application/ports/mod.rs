pub mod repositories;
pub mod survey_source;

pub use repositories::{ResultStore, StoreSummary};
pub use survey_source::{RepositorySearch, WorkflowSource};
