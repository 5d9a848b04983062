pub mod common;
pub mod core;
pub mod export;
pub mod migrate;
pub mod suggest;
