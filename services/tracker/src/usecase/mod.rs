pub mod access;
pub mod auth;
pub mod issue;
pub mod member;
pub mod passkey;
pub mod password_reset;
pub mod project;
pub mod session;
pub mod team;
pub mod two_factor;
pub mod user;
pub mod workspace;
