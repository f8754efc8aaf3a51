pub mod admin;
pub mod identity;
pub mod request_id;

pub use admin::{AdminAccess, ADMIN_TOKEN_HEADER};
pub use identity::{CurrentUser, USER_ID_HEADER};
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId, REQUEST_ID_HEADER};
