// Payment processor integration: checkout sessions and webhook verification

pub mod gateway;
pub mod webhook;

pub use gateway::{CheckoutSession, HttpPaymentGateway, PaymentError, PaymentGateway};
