pub mod fields;
pub mod formats;
