//! Cookie builders for the session and two-factor ticket cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the opaque session token.
pub const TRACKER_SESSION: &str = "tracker_session";

/// Cookie name for the two-factor ticket issued after a password step.
pub const TRACKER_TWO_FACTOR: &str = "tracker_two_factor";

/// Session lifetime in seconds (7 days).
pub const SESSION_EXP: u64 = 604800;

/// Sessions older than this many seconds (1 day) are extended on use.
pub const SESSION_UPDATE_AGE: u64 = 86400;

/// Two-factor ticket lifetime in seconds (5 minutes).
pub const TWO_FACTOR_EXP: u64 = 300;

fn build(name: &'static str, value: String, domain: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .domain(domain)
        .max_age(max_age)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Set the session cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use tracker_auth_types::cookie::{set_session_cookie, TRACKER_SESSION};
///
/// let jar = CookieJar::new();
/// let jar = set_session_cookie(jar, "token_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(TRACKER_SESSION).unwrap();
/// assert_eq!(cookie.value(), "token_value");
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_session_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(build(
        TRACKER_SESSION,
        value,
        domain,
        Duration::seconds(SESSION_EXP as i64),
    ))
}

/// Set the two-factor ticket cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use tracker_auth_types::cookie::{set_two_factor_cookie, TRACKER_TWO_FACTOR};
///
/// let jar = CookieJar::new();
/// let jar = set_two_factor_cookie(jar, "ticket".to_string(), "example.com".to_string());
/// let cookie = jar.get(TRACKER_TWO_FACTOR).unwrap();
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(300)));
/// assert!(cookie.http_only().unwrap_or(false));
/// ```
pub fn set_two_factor_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(build(
        TRACKER_TWO_FACTOR,
        value,
        domain,
        Duration::seconds(TWO_FACTOR_EXP as i64),
    ))
}

/// Clear the session cookie by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use tracker_auth_types::cookie::{clear_session_cookie, set_session_cookie, TRACKER_SESSION};
///
/// let jar = set_session_cookie(CookieJar::new(), "t".to_string(), "example.com".to_string());
/// let jar = clear_session_cookie(jar, "example.com".to_string());
/// let cookie = jar.get(TRACKER_SESSION).unwrap();
/// assert_eq!(cookie.value(), "");
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookie(jar: CookieJar, domain: String) -> CookieJar {
    jar.add(build(TRACKER_SESSION, String::new(), domain, Duration::ZERO))
}

/// Clear the two-factor ticket cookie.
pub fn clear_two_factor_cookie(jar: CookieJar, domain: String) -> CookieJar {
    jar.add(build(TRACKER_TWO_FACTOR, String::new(), domain, Duration::ZERO))
}
