//! Infrastructure layer - Store backends and service implementations

pub mod experiment;
pub mod logging;
pub mod services;
pub mod session;
pub mod store;
