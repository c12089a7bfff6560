pub mod fs;
pub mod http;
pub mod onnx;
pub mod render;
