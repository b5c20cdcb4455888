//! User settings: the `Settings` tree and how it is layered from defaults,
//! an optional TOML file and `TAPEDECK__*` environment variables.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
