pub mod config;
pub mod document;
pub mod render;
pub mod resolver;
pub mod reveal;
pub mod scheduler;
pub mod template;
pub mod widget;
