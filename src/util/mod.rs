pub mod names;
pub mod paths;

pub use names::sanitize_spider_name;
pub use paths::base_path;
