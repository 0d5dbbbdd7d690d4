// Library surface for the binary and for headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod clock;
pub mod code_generator;
pub mod config;
pub mod direction;
pub mod drill;
pub mod effects;
pub mod evaluation;
pub mod input;
pub mod ledger;
pub mod logging;
pub mod runtime;
pub mod stats;
pub mod ui;
