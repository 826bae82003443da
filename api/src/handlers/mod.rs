pub mod auth;
pub mod health;
pub mod navigation;
pub mod posts;
pub mod projects;
pub mod users;
