pub mod account;
pub mod token;
pub mod tombstone;

pub use account::{Account, AccountRole};
pub use token::{
    Flash, FlashKind, LoginPayload, PasswordResetPayload, SessionPayload, Token, TokenKind,
    TokenPayload, VerifyEmailPayload,
};
pub use tombstone::Tombstone;
