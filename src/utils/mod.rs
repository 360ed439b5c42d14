pub mod date_range;
pub mod export;
pub mod validate;
