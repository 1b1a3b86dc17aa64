pub mod loader;
pub mod output;
pub mod pipeline;
pub mod render;
