// Secret encryption at rest
pub mod credentials;

// Per-user integration settings and persistence
pub mod settings;

// TTL cache for expensive provider reads
pub mod cache;

// OAuth session management (Google Calendar, Spotify)
pub mod oauth;

// Provider HTTP clients
pub mod providers;

// Canonical read models
pub mod model;

// Provider-shape to canonical-model mapping
pub mod normalize;

// Integration facade consumed by the API layer
pub mod facade;

// HTTP API
pub mod api;

// TOML configuration
pub mod config;
