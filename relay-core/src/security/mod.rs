/// Security module for input validation and security utilities

pub mod validation;

pub use validation::{sanitize_repo_name, validate_file_name, verify_secret, ValidationError};
