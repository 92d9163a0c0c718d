pub mod args;
pub mod prompt;
pub mod template;
