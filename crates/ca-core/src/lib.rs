//! ca-core: Calendar Assistant Core Library
//!
//! LLM との通信、イベント抽出、イベントストア、
//! システムプロンプト生成のコア機能を提供します。

pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod prompt;

pub use config::{ApiConfig, Config, LlmConfig, LlmProvider, ScheduleConfig};
pub use error::{Error, Result};
pub use event::{
    AssistantReply, Category, Event, EventFields, EventId, EventStore, ExtractedEvent,
    ExtractionError, InvalidEvent, StoreChange, SubscriptionId, extract, ingest_reply,
    render_reply,
};
pub use llm::{
    ChatMessage, Completion, GenerationRequest, LlmClient, Role, TextGenerator, TextStream,
};
pub use prompt::system_prompt;
