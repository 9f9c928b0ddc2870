pub mod a001_pass;
