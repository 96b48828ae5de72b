//! Resource service layer
//!
//! One typed client per API resource. Each service wraps a
//! [`ResourceService`](resource::ResourceService) bound to its endpoint and returns the raw
//! [`HttpResponse`](crate::http::HttpResponse) so callers can assert on it.

mod login;
mod resource;
mod users;

pub use login::LoginService;
pub use users::UserService;
