mod app;
mod events;
mod paths;

pub use app::run_app;
