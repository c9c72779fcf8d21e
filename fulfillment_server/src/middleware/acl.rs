//! Admin API-key middleware for the order fulfillment gateway.
//! This middleware can be placed on any route or service.
//!
//! It checks the incoming request for an `ofg-api-key` header and compares it against the configured admin key. A
//! missing or wrong key yields a 401 Unauthorized response. An empty configured key rejects everything, so a server
//! without OFG_ADMIN_API_KEY set has no admin surface rather than an open one.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    web,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use ofg_common::Secret;

pub const ADMIN_KEY_HEADER: &str = "ofg-api-key";

/// The configured admin key, stored in app data so the middleware can reach it.
#[derive(Clone)]
pub struct AdminKey(pub Secret<String>);

pub struct AclMiddlewareFactory;

impl AclMiddlewareFactory {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        AclMiddlewareFactory
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let admin_key = req
                .app_data::<web::Data<AdminKey>>()
                .ok_or_else(|| {
                    log::warn!("🛡️ No admin key configured in app data");
                    ErrorInternalServerError("No admin key configured")
                })?
                .0
                .clone();
            let presented = req.headers().get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok());
            match presented {
                Some(key) if !admin_key.is_empty() && key == admin_key.reveal() => service.call(req).await,
                Some(_) => {
                    log::warn!("🛡️ Invalid admin API key presented. Denying access.");
                    Err(ErrorUnauthorized("Invalid API key"))
                },
                None => Err(ErrorUnauthorized("No API key provided")),
            }
        })
    }
}
