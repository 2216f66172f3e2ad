
mod auth_test;
mod issue_test;
mod member_test;
mod passkey_test;
mod project_test;
mod router_test;
mod session_test;
mod team_test;
mod two_factor_test;
mod user_test;
