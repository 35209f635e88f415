pub mod crawler;
pub mod survey_service;
pub mod workflow_scanner;

pub use crawler::RepositoryCrawler;
pub use survey_service::SurveyService;
pub use workflow_scanner::WorkflowScanner;
