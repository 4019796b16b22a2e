//! Data model (spec §3): the record shapes shared across every component.

mod site_profile;
mod crawl_result;
mod crawl_config;
mod domain_state;
mod job;
mod query_ast;
mod document_score;
mod logs;

pub use site_profile::*;
pub use crawl_result::*;
pub use crawl_config::*;
pub use domain_state::*;
pub use job::*;
pub use query_ast::*;
pub use document_score::*;
pub use logs::*;
