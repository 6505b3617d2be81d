// Screening LLM prompt templates.
// All prompts for the screening module are defined here.

pub const SUMMARY_SYSTEM: &str = "\
You are an assistant to a technical recruiter. \
You write short, neutral synopses of resume excerpts. \
Respond in plain prose only: no markdown headings, no bullet lists, no preamble.";

pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Write a concise summary of the following resume excerpt for a recruiter.

RESUME: {resume_id}

EXCERPT:
{passage}

RULES:
1. At most 4 sentences.
2. Cover, where present: current or most recent role, years of experience, core skills, education.
3. Mention concrete numbers (team sizes, percentages, years) exactly as written.
4. Do not rate or recommend the candidate."#;
