//! CLI command implementations.

mod config;
mod doctor;
mod generate;
mod index;
mod list;
mod search;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::run_generate;
pub use index::run_index;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;
