//! Prompt templates for the council protocol phases

/// Templates for generating prompts at each council step
pub struct CouncilPrompt;

impl CouncilPrompt {
    /// User prompt for the generate step, with optional supporting context
    pub fn generate(user_prompt: &str, context: &str) -> String {
        if context.is_empty() {
            user_prompt.to_string()
        } else {
            format!(
                r#"Supporting context:

{context}

Request:

{user_prompt}"#
            )
        }
    }

    /// System prompt for the critique step
    pub fn critique_system() -> &'static str {
        r#"You are a critical reviewer evaluating anonymous responses to the same request.
Assess each response for accuracy, completeness, clarity, and practical usefulness.
Be fair but thorough. You must give a numeric score.
Respond in JSON: {"score": <1-10 integer>, "feedback": "<2-3 sentence justification>"}"#
    }

    /// User prompt asking one critic to score one anonymized response
    pub fn critique(original_prompt: &str, label: &str, content: &str) -> String {
        format!(
            r#"Original request: {original_prompt}

Response {label}:
---
{content}
---

Score Response {label} from 1 (poor) to 10 (excellent) with brief justification.
Respond in JSON: {{"score": <1-10>, "feedback": "<justification>"}}"#
        )
    }

    /// System prompt for the synthesis step
    pub fn synthesis_system() -> &'static str {
        r#"You are a moderator synthesizing the best available answer.
You are given the winning response from a panel review plus the critiques of the other responses.
Merge the strongest elements into one coherent final answer.
Do not mention the panel, the scores, or the review process. Answer the request directly."#
    }

    /// User prompt for the synthesis step
    pub fn synthesis(
        original_prompt: &str,
        winning_response: &str,
        critiques: &[(String, String)],
    ) -> String {
        let mut prompt = format!(
            r#"Original request: {original_prompt}

Winning response:
---
{winning_response}
---
"#
        );

        if !critiques.is_empty() {
            prompt.push_str("\nReviewer feedback on the alternatives:\n");
            for (label, feedback) in critiques {
                prompt.push_str(&format!("\n--- Feedback on Response {label} ---\n{feedback}\n"));
            }
        }

        prompt.push_str(
            "\nProduce the final answer, improving the winning response where the feedback identifies gaps.",
        );
        prompt
    }
}
