pub mod config;
pub mod file_ops;
pub mod fs_utils;
pub mod import;
pub mod parser;
pub mod quality;
pub mod release;
pub mod sample;
pub mod scanner;
pub mod virus_scan;
