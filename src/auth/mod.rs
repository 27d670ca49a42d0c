//! Cookie-based authentication: setting and clearing the session cookie and
//! the middleware that guards the per-user pages.

mod cookie;
mod middleware;

pub use cookie::{
    COOKIE_USER_ID, DEFAULT_COOKIE_DURATION, get_user_id_from_cookies, invalidate_auth_cookie,
    set_auth_cookie,
};
pub use middleware::{AuthState, auth_guard};
