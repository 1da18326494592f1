//! Pre-commit guard against editing files another agent holds an exclusive
//! reservation on.

pub mod build_info;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod guard;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod output;
pub mod store;
