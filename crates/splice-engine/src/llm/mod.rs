pub mod client;

pub use client::OpenRouterClient;
