pub mod app;
pub mod canvas;
pub mod components;
pub mod config;
pub mod controller;
pub mod export;
pub mod gateway;
pub mod history;
pub mod layout;
pub mod listeners;
pub mod logging;
pub mod measure;
pub mod persist;
pub mod state;
pub mod store;
