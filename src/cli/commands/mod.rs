//! CLI command implementations.

mod ask;
mod build;
mod config;
mod folders;
mod list;
mod query;
mod search;
mod sync;
mod upload;

pub use ask::run_ask;
pub use build::run_build;
pub use config::run_config;
pub use folders::run_folders;
pub use list::run_list;
pub use query::run_query;
pub use search::run_search;
pub use sync::run_sync;
pub use upload::run_upload;
