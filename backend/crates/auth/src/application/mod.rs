//! Application Layer

pub mod account_directory;
pub mod account_service;
pub mod config;
pub mod session;
pub mod token_store;

pub use account_directory::AccountDirectory;
pub use account_service::{
    AccountService, ChangeEmailError, LinkRequestError, LoginError, LoginTokenError,
    RedeemResetError, SetPasswordError, SignupError, VerifyEmailError,
};
pub use config::AuthConfig;
pub use session::{ResolvedSession, SessionManager};
pub use token_store::TokenStore;
