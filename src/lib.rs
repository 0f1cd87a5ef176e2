pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod sessions;
pub mod state;
pub mod ws;

pub use routes::app;
pub use state::AppState;

#[cfg(test)]
mod test;
