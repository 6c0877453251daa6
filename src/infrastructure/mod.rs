// Infrastructure layer - External dependencies and adapters
pub mod chart_feed;
pub mod chunked_json;
pub mod config;
pub mod thingspeak_client;
