pub mod capture_metadata;
pub mod constants;
pub mod frame;
