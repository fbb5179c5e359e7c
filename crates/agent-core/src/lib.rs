//! # agent-core
//!
//! Core agent logic over remote assistant services: sessions, the run
//! polling loop, tool dispatch, and the storage seams for conversations,
//! facts, and agent profiles.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Session                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Run Loop   │  │    Tools    │  │  AssistantBackend    │  │
//! │  │  (polling)  │──│   Registry  │──│  (Strategy)          │  │
//! │  └──────┬──────┘  └─────────────┘  └──────────────────────┘  │
//! │         │                                                    │
//! │  ┌──────┴──────┐                                             │
//! │  │  ConvoLog   │──▶ ConvoStore / FactStore / ProfileStore    │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `AssistantBackend` trait enables swapping the remote assistants
//! service (or a scripted double in tests) without changing agent logic,
//! and the store traits do the same for persistence.

pub mod backend;
pub mod convo;
pub mod error;
pub mod facts;
pub mod profile;
pub mod run;
pub mod session;
pub mod tool;

pub use backend::{
    AssistantBackend, AssistantSpec, ContentBlock, RequiredCall, Role, RunState, ThreadMessage,
    ToolOutput,
};
pub use convo::{ConvoEntry, ConvoLog, ConvoRecord, ConvoStore, MemoryConvoStore, MsgType};
pub use error::{AgentError, Result};
pub use facts::{FactFilter, FactQuery, FactSort, FactStore, MemoryFactStore};
pub use profile::{AgentProfile, MemoryProfileStore, ProfileStore, DEFAULT_INSTANCE};
pub use run::RunOptions;
pub use session::Session;
pub use tool::{Tool, ToolRegistry, ToolSchema};
