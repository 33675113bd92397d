// Sub-modules organized by functional domain
pub mod api;
pub mod auth;
pub mod conversation;
pub mod dashboard;
pub mod document;
pub mod exchange_rate;
pub mod import_export;
pub mod issue;
pub mod organization;
pub mod project;
pub mod resource;
pub mod risk;
pub mod task;
pub mod time_entry;

pub use api::*;
pub use auth::*;
pub use conversation::*;
pub use document::*;
pub use exchange_rate::*;
pub use import_export::*;
pub use issue::*;
pub use organization::*;
pub use project::*;
pub use resource::*;
pub use risk::*;
pub use task::*;
pub use time_entry::*;
