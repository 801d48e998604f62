pub mod discovery;
pub mod renderer;
pub mod service;
