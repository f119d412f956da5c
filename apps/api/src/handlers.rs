pub mod health;
pub mod user_import;
