pub mod login;
pub mod logout;
pub mod password;
pub mod signup;

use entity::user::Model as UserModel;

use crate::utils::webutils::safe_redirect;

pub const ADMIN_REDIRECT: &str = "/";
pub const USER_REDIRECT: &str = "/dashboard/";

/// Superusers land on the site root, everyone else on their dashboard,
/// unless the client asked for a safe `next` path.
pub fn login_redirect(user: &UserModel, next: Option<&str>) -> String {
    safe_redirect(next).unwrap_or_else(|| {
        if user.is_superuser {
            ADMIN_REDIRECT.to_string()
        } else {
            USER_REDIRECT.to_string()
        }
    })
}
