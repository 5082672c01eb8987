//! External API integrations

pub mod imagery;
pub mod llm;
pub mod weather;

pub use imagery::{ImageryClient, ImageryError, ImagerySettings};
pub use llm::{GeminiClient, InsightProvider, LlmError, OpenAiClient};
pub use weather::{WeatherClient, WeatherError};
