//! verdantctl library - commands and terminal rendering for the Verdant CLI.

pub mod commands;
pub mod ui;
