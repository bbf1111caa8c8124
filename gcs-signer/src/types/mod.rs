mod environment;

pub use environment::{Environment, DEFAULT_SIGNED_URL_TIMEOUT_MINUTES};
