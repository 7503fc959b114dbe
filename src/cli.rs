//! CLI domain: parse, route and presentation only.
//! No domain orchestration; a single route table dispatches to the library.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands, ListFormat};
pub use presentation::{
    format_add_event, format_list_json, format_list_text, format_removed, ListEntry,
};
pub use route::{load_settings, RunContext};
