pub mod message;
pub mod persona;
