pub mod account_service;
pub mod context;
pub mod conversations_service;
pub mod dashboard_service;
pub mod documents_service;
pub mod import_export_service;
pub mod issues_service;
pub mod members_service;
pub mod organizations_service;
pub mod projects_service;
pub mod resources_service;
pub mod risks_service;
pub mod tasks_service;
pub mod time_entries_service;

pub use account_service::AccountService;
pub use conversations_service::ConversationsService;
pub use dashboard_service::DashboardService;
pub use documents_service::DocumentsService;
pub use import_export_service::ImportExportService;
pub use issues_service::IssuesService;
pub use members_service::MembersService;
pub use organizations_service::OrganizationsService;
pub use projects_service::ProjectsService;
pub use resources_service::ResourcesService;
pub use risks_service::RisksService;
pub use tasks_service::TasksService;
pub use time_entries_service::TimeEntriesService;
