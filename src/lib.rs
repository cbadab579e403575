mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod schema;
    pub mod validate;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod constants;

mod cache {
    pub mod cache;
    pub mod short_link;
}

pub use authentication::*;
pub use cache::cache::*;
pub use cache::short_link;
pub use constants::*;
pub use database::*;
