//! HTTP surface: routes and request handlers

pub mod handlers;
pub mod routes;
