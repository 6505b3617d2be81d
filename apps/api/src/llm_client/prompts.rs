// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to every system prompt that describes a candidate.
pub const FACTUAL_INSTRUCTION: &str = "\
    CRITICAL: Only state what the provided text supports. \
    Do NOT infer, interpolate, or invent employers, dates, degrees, or skills. \
    If the text is a fragment, summarize the fragment; do not guess at the rest.";
