pub mod token;

pub use token::{CachedTokenProvider, PasswordGrant, StaticTokenProvider, TokenProvider};
