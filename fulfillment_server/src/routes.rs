//! Handlers for the read and admin API.
//!
//! Webhook handlers live in [`crate::webhook_routes`]; everything here sits behind the admin key. Handlers must
//! never block the worker thread: anything that waits on the database goes through async calls on the
//! [`FulfillmentApi`] handle.

use actix_web::{get, web, HttpResponse, Responder};
use fulfillment_engine::{
    db_types::OrderNumber,
    traits::{FulfillmentDatabase, OrderManagement},
    FulfillmentApi,
    TransitionOutcome,
};
use log::*;

use crate::{
    data_objects::{AdminStatusUpdate, JsonResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires admin)  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order => Get "/orders/{order_number}" impl FulfillmentDatabase where requires admin);
/// Route handler for fetching a single order by its order number.
pub async fn order<B: FulfillmentDatabase>(
    path: web::Path<String>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    debug!("💻️ GET order {order_number}");
    let order = api
        .db()
        .fetch_order_by_number(&order_number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_number}")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_history => Get "/orders/{order_number}/history" impl FulfillmentDatabase where requires admin);
/// Route handler for fetching an order together with its full status ledger.
pub async fn order_history<B: FulfillmentDatabase>(
    path: web::Path<String>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    debug!("💻️ GET history for order {order_number}");
    let result = api.order_with_history(&order_number).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(customer_orders => Get "/customers/{customer_id}/orders" impl FulfillmentDatabase where requires admin);
pub async fn customer_orders<B: FulfillmentDatabase>(
    path: web::Path<String>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET orders for customer {customer_id}");
    let orders = api.db().orders_for_customer(&customer_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(admin_set_status => Post "/orders/{order_number}/status" impl FulfillmentDatabase where requires admin);
/// Route handler for manual status overrides.
///
/// The update goes through exactly the same pipeline as external events, so admins can only follow edges of the
/// transition graph. A rejected move comes back as 409, a target that no event leads to as 400.
pub async fn admin_set_status<B: FulfillmentDatabase>(
    path: web::Path<String>,
    body: web::Json<AdminStatusUpdate>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    let update = body.into_inner();
    debug!("💻️ POST set status of order {order_number} to {} for {}", update.status, update.updated_by);
    let outcome = api.admin_set_status(&order_number, update.status, &update.updated_by, update.reason).await?;
    let response = match &outcome {
        TransitionOutcome::Applied { order, .. } => {
            JsonResponse::success(format!("Order {} is now {}", order.order_number, order.status))
        },
        TransitionOutcome::AlreadyApplied { order } => {
            JsonResponse::success(format!("Order {} was already {}", order.order_number, order.status))
        },
    };
    Ok(HttpResponse::Ok().json(response))
}
