pub mod credential;
pub mod image;
