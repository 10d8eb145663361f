pub const FACE_MESH_MODEL_NAME: &str = "face_mesh_468.onnx";
pub const FACE_MESH_MODEL_URL: &str =
    "https://github.com/facemetric/facemetric/releases/download/v0.1.0/face_mesh_468.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
