pub mod app;
pub mod events;
pub mod history;
pub mod scheduler;
pub mod state;
