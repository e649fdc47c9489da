pub mod models;

pub use models::{Comment, Post};
