pub mod access;
pub mod directory;
pub mod health;
