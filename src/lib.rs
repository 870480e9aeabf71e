// Bulk simplified-to-traditional Chinese conversion over MySQL tables and
// directory trees.

// Shared types
pub mod db_types;
pub mod error;
pub mod sql_utils;

// Conversion and pacing
pub mod convert;
pub mod progress;
pub mod throttle;

// Table scan engine and its MySQL store
pub mod mysql;
pub mod table_scan;

// Runs
pub mod config;
pub mod file_convert;
pub mod runner;
