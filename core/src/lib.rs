pub mod registry;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod source;
pub mod validators;

pub mod error;
