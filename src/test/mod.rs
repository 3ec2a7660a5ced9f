mod backoff;
mod clock;
mod medium;
mod network_integration;
