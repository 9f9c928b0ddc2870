pub mod pass_type;
