// Shared prompt fragments.
// Each feature that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Appended to every system instruction: the response body is shown to users verbatim.
pub const PLAIN_TEXT_ONLY: &str = "只输出正文本身，不要加标题、引号、编号或任何解释说明。";
