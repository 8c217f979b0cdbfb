//! Settings module: persisted user preferences read at startup.

mod store;

pub use store::{Settings, StartDirectory, load_settings, load_settings_from};
