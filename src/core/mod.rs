//! Core building blocks: sticker parameters and the pixel pipeline stages
//! (composite, crop, resize, border). These are internal primitives consumed
//! by the orchestrator and the high-level `api` module.
pub mod params;
pub mod processing;
