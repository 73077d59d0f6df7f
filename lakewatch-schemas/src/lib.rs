pub mod api;
pub mod color;
pub mod file_formats;
pub mod sample;
