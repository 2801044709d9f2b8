pub mod access;
pub mod middleware;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod validate;
