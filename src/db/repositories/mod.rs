pub mod assignments;
pub mod conversations;
pub mod dependencies;
pub mod documents;
pub mod exchange_rates;
pub mod issues;
pub mod members;
pub mod organizations;
pub mod projects;
pub mod resources;
pub mod risks;
pub mod tasks;
pub mod time_entries;
pub mod users;
