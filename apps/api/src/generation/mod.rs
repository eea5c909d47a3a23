// Review generation.
// Streaming path: handlers → controller → (params, composer, llm_client, extractor) → events.
// All LLM calls go through llm_client — no direct HTTP calls here.

pub mod batch;
pub mod composer;
pub mod controller;
pub mod events;
pub mod extractor;
pub mod handlers;
pub mod params;
pub mod prompts;
