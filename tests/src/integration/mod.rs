//! # Integration Test Flows
//!
//! Two communicators talking over the channel transport, exercising the
//! complete call lifecycle: correlation, timeouts, notifications, error
//! propagation and shutdown.

mod errors;
mod notifications;
mod shutdown;
mod timeouts;
mod transport;
