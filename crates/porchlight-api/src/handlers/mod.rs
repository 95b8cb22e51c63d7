pub mod autocomplete;
pub mod health;
pub mod photo_upload;
