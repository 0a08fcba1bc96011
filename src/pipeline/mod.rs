//! Pipeline stages for reviewing a paper.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the network-bound stages can be replaced in tests.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ prompts::build_prompt ──▶ llm ──▶ output::format_report
//! (path/URL/stdin)  (pdf/text)                  (chat API)
//! ```
//!
//! 1. [`input`]: resolve a path, `-` or URL to bytes plus a content hint
//! 2. [`extract`]: PDF text extraction on `spawn_blocking`, or strict UTF-8
//!    decoding for text; rejects whitespace-only content
//! 3. [`llm`]: one chat-completion call; the only stage besides URL
//!    download with network I/O

pub mod extract;
pub mod input;
pub mod llm;
