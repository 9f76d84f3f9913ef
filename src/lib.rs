pub mod api;
pub mod app;
pub mod coordinator;
pub mod opener;
pub mod ui;
pub mod utils;
