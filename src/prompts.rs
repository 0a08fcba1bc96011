//! Prompt templates and the prompt builder.
//!
//! Every piece of prompt wording lives here so a change to the review format
//! touches exactly one file, and tests can inspect the rendered prompt
//! without a model behind it.
//!
//! The rendered prompt is laid out in a fixed order:
//!
//! 1. the role instruction (reading recommendations for a research paper,
//!    plus the configured reviewer tone),
//! 2. the domain and language, verbatim, followed by the plain-text review
//!    template in the selected language,
//! 3. the full paper text.
//!
//! Rendering is a pure function of its inputs: no clock, no randomness, no
//! truncation.

use crate::config::{Language, ReviewConfig};
use crate::error::ReviewError;
use crate::pipeline::extract::ExtractedText;
use std::fmt;

/// Role instruction that opens every prompt.
pub const ROLE_INSTRUCTION: &str = "You are a seasoned research reviewer. Your task is to \
produce reading recommendations for a research paper: judge its contribution, list its \
strengths and weaknesses, and tell the reader whether it is worth reading.";

/// English review template. `{domain}` and `{language}` are substituted.
pub const TEMPLATE_EN: &str = r#"Domain: {domain}
Language: {language}

Provide the review in English, with a strict but fair tone, for the {domain} domain.
Use this plain-text template (no JSON, no code fences):
Summary: ...
Strengths:
- ...
Weaknesses:
- ...
Questions:
- ...
Decision (Reading suggestion: Must Read / Skim Optional / Skip): ..."#;

/// Chinese review template. `{domain}` and `{language}` are substituted.
pub const TEMPLATE_ZH: &str = r#"领域 (Domain): {domain}
语言 (Language): {language}

请用中文给出审稿意见，语气严格但公正，领域为{domain}。
输出采用以下纯文本模板（不要使用 JSON，也不要用代码块）：
Summary: ...
Strengths:
- ...
Weaknesses:
- ...
Questions:
- ...
Decision (阅读建议: 精读 / 可选浏览 / 可忽略): ..."#;

/// Header placed directly before the paper body.
pub const PAPER_HEADER_EN: &str = "PAPER:";
pub const PAPER_HEADER_ZH: &str = "论文内容 (PAPER):";

/// A fully rendered prompt, sent as the sole user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render the review prompt for `text` under `config`.
///
/// # Errors
/// [`ReviewError::Config`] when the domain or language is empty.
pub fn build_prompt(text: &ExtractedText, config: &ReviewConfig) -> Result<Prompt, ReviewError> {
    let domain = config.domain.as_str();
    if domain.trim().is_empty() {
        return Err(ReviewError::Config("domain must not be empty".into()));
    }
    let language = config.language.as_str();
    if language.trim().is_empty() {
        return Err(ReviewError::Config("language must not be empty".into()));
    }

    let (template, paper_header) = match Language::from_tag(language) {
        Language::Zh => (TEMPLATE_ZH, PAPER_HEADER_ZH),
        Language::En => (TEMPLATE_EN, PAPER_HEADER_EN),
    };

    let mut prompt = String::with_capacity(text.as_str().len() + 1024);
    prompt.push_str(ROLE_INSTRUCTION);
    prompt.push('\n');
    prompt.push_str(&tone_line(&config.tone));
    prompt.push_str("\n\n");
    prompt.push_str(
        &template
            .replace("{domain}", domain)
            .replace("{language}", language),
    );
    prompt.push_str("\n\n");
    prompt.push_str(paper_header);
    prompt.push('\n');
    prompt.push_str(text.as_str());

    Ok(Prompt(prompt))
}

fn tone_line(tone: &str) -> String {
    let tone = tone.trim();
    if tone.is_empty() {
        "Respond using the requested language.".to_string()
    } else {
        format!("Maintain a strict, skeptical, concise tone: {tone}. Respond using the requested language.")
    }
}
