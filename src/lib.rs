pub mod config;
pub mod logger;
pub mod error;
pub mod store;
pub mod change_detector;
pub mod content;
pub mod source_list;
pub mod loader;
pub mod collector;
pub mod paginator;
pub mod writer;
pub mod render;
pub mod reporter;
pub mod site;
pub mod watch;
pub mod text_utils;
mod test_data;
