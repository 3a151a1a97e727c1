mod settings;

pub use settings::{Settings, DB_PATH_ENV};
