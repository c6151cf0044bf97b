mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
}
mod media {
    pub mod codec;
    pub mod storage;
}
mod views {
    pub mod profile;
    pub mod recipe;
    pub mod shopping_list;
    pub mod subscription;
}
mod config;
mod constants;
pub mod routes;
mod state;

pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use media::*;
pub use state::*;
pub use views::*;
