mod fulfillment_api;
pub mod order_objects;

pub use fulfillment_api::FulfillmentApi;
