mod acl;
mod hmac;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService, AdminKey, ADMIN_KEY_HEADER};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService};
