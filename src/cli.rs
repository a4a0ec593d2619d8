//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_RUN_INCOMPLETE};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_book_list, format_book_status, format_run_summary, format_section_heading,
    format_validation,
};
pub use route::RunContext;
