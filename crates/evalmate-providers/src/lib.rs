//! Service integrations for the evaluation pipeline.
//!
//! Implements the collaborator traits from `evalmate-core`: an OpenAI
//! reasoning agent, a Marker document-to-text client and an ElevenLabs
//! speech synthesizer, plus mocks and the TOML configuration that wires
//! them together.

pub mod config;
pub mod elevenlabs;
mod http;
pub mod marker;
pub mod mock;
pub mod openai;

pub use config::{
    create_agent, create_extractor, create_synthesizer, load_config, load_config_from,
    AgentConfig, EvalmateConfig, OcrConfig, SpeechConfig,
};
