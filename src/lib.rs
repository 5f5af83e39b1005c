use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod auth;
pub mod competitions;
pub mod config;
pub mod permission;
pub mod schema;
pub mod settings;
pub mod state;
pub mod template;
pub mod users;
pub mod util_resp;
pub mod validation;
pub mod widgets;

#[cfg(test)]
mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
