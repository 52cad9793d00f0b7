pub mod config;
pub mod event;
pub mod schema;
pub mod user;
pub mod value;

pub use config::*;
pub use event::*;
pub use schema::*;
pub use user::*;
pub use value::*;
