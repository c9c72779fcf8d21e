//! HMAC signature checks for incoming webhooks.
//!
//! Every webhook party signs its deliveries with a shared secret: the signature is the base64-encoded HMAC-SHA256
//! of the request body, carried in a party-specific header. The payment processor additionally prepends the
//! configured notification URL to the signed data, which binds the signature to this endpoint; the
//! [`HmacMiddlewareFactory::with_signed_prefix`] builder caters for that.
//!
//! The middleware buffers the body, verifies the signature in constant time, and re-injects the payload so
//! extractors downstream see an untouched request. Missing or mismatching signatures are rejected with 401 before
//! any payload parsing happens.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use ofg_common::Secret;

use crate::helpers::verify_hmac;

struct HmacConfig {
    header: String,
    key: Secret<String>,
    /// Prepended to the request body before the MAC is computed. Empty for body-only schemes.
    signed_prefix: String,
    // When false, requests pass through unchecked. Guarded by the fail-closed startup checks in config.rs.
    enabled: bool,
}

pub struct HmacMiddlewareFactory {
    config: Rc<HmacConfig>,
}

impl HmacMiddlewareFactory {
    pub fn new(header: &str, key: Secret<String>, enabled: bool) -> Self {
        let config = HmacConfig { header: header.into(), key, signed_prefix: String::new(), enabled };
        Self { config: Rc::new(config) }
    }

    pub fn with_signed_prefix(self, prefix: &str) -> Self {
        let config = HmacConfig {
            header: self.config.header.clone(),
            key: self.config.key.clone(),
            signed_prefix: prefix.to_string(),
            enabled: self.config.enabled,
        };
        Self { config: Rc::new(config) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { config: Rc::clone(&self.config), service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    config: Rc<HmacConfig>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = Rc::clone(&self.config);
        Box::pin(async move {
            if !config.enabled {
                trace!("🔐️ Signature checks are disabled. Passing the request through.");
                return service.call(req).await;
            }
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Could not buffer the request body: {e:?}");
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let supplied = match req.headers().get(&config.header).and_then(|v| v.to_str().ok()) {
                Some(sig) => sig.to_string(),
                None => {
                    warn!("🔐️ Webhook delivery without a {} header. Denying access.", config.header);
                    return Err(ErrorUnauthorized("No HMAC signature found."));
                },
            };
            let mut signed_data = Vec::with_capacity(config.signed_prefix.len() + body.len());
            signed_data.extend_from_slice(config.signed_prefix.as_bytes());
            signed_data.extend_from_slice(&body);
            if !verify_hmac(config.key.reveal(), &signed_data, &supplied) {
                warn!("🔐️ Webhook delivery with a bad {} signature. Denying access.", config.header);
                return Err(ErrorUnauthorized("Invalid HMAC signature."));
            }
            trace!("🔐️ Signature verified ✅️");
            req.set_payload(bytes_to_payload(body));
            service.call(req).await
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
