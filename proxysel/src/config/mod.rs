pub mod config;
mod error;
mod provider;
mod proxy_list;

pub use config::*;
pub use error::*;
pub use provider::*;
pub use proxy_list::*;
