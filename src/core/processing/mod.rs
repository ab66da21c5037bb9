pub mod border;
pub mod composite;
pub mod crop;
pub mod pipeline;
pub mod resize;
