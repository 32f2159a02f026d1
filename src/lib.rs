//! roomplan - floor plan and room occupancy manager

pub mod app;
pub mod commands;
pub mod config;
pub mod editor;
pub mod logging;
pub mod models;
pub mod palette;
pub mod report;
pub mod scene;
pub mod session;
pub mod store;
pub mod tui;
pub mod viewport;
