pub mod a001_pass;
pub mod common;
