pub mod image_file_source;
pub mod memory_image_source;
#[cfg(target_os = "linux")]
pub mod v4l_camera_source;
