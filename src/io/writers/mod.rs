pub mod lossless;
pub mod metadata;
