//! Auth types shared by tracker services.
//!
//! Session cookie builders, opaque session tokens, the signed two-factor
//! ticket and the `SessionToken` extractor.

pub mod cookie;
pub mod session;
pub mod token;
