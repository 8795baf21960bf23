pub mod decoder;
pub mod extraction;
