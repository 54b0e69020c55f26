pub mod account;
pub mod recipe;
