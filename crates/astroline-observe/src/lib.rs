//! Observability for Astroline: tracing subscriber and OpenTelemetry setup.

pub mod tracing_setup;
