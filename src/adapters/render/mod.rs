pub mod annotate;
pub mod encode;
