mod client;
mod errors;
pub mod types;
mod user_agent;
pub use self::client::{Client, FormMethod, DEFAULT_BASE_URL};
pub use self::errors::Error;
