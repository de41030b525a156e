//! Flick LLM - local chat model inference.
//!
//! Loads a quantized llama-family model from a GGUF file with candle and
//! exposes it as a [`flick_core::ChatModel`]. Prompts are rendered with one
//! of the supported [`ChatTemplate`]s; the template is taken from the
//! settings or recognised from the GGUF metadata.
//!
//! ```rust,no_run
//! use flick_core::{ChatMessage, ChatModel, GenerationBudget};
//! use flick_llm::{GgufChatModel, LlmSettings};
//!
//! let model = GgufChatModel::load(LlmSettings::new(
//!     "models/DeepSeek-R1-Distill-Llama-8B-Q4_K_M.gguf",
//!     "models/tokenizer.json",
//! ))?;
//! let reply = model
//!     .chat(&[ChatMessage::user("Name one heist movie.")], GenerationBudget::for_items(1))
//!     .unwrap();
//! println!("{}", reply);
//! # Ok::<(), flick_llm::LlmError>(())
//! ```

mod error;
mod model;
mod template;

pub use error::{LlmError, Result};
pub use model::{GgufChatModel, LlmSettings, MAX_SEQUENCE_LENGTH};
pub use template::ChatTemplate;
