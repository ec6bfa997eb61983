//! Domain types for multi-currency POS payments and the ports the application
//! layer depends on.

pub mod currency;
pub mod event;
pub mod payment;
pub mod payment_method;
pub mod ports;
pub mod pos_config;
pub mod staging;
