pub mod commands;
pub mod github;
pub mod http;
pub mod index;
pub mod runtime;
pub mod source;
pub mod upstream;
pub mod wheel;
