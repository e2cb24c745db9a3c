//! Prompt templates for routing, role passes, discussion and synthesis

use std::collections::BTreeMap;

use crate::role::entities::{Role, RoleCatalog, RoleOutput};

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    // ==================== Routing ====================

    /// System prompt for the intent classifier
    pub fn classify_system() -> &'static str {
        r#"You route home-buying questions to specialist advisors.
Pick every advisor whose expertise is needed to answer the question, and only those.
Reply with JSON only, in the form {"roles": ["role_id", ...]}."#
    }

    /// User prompt for the intent classifier
    pub fn classify_user(utterance: &str, catalog: &RoleCatalog) -> String {
        let mut prompt = String::from("Available advisors:\n");
        for role in catalog.iter() {
            prompt.push_str(&format!("- {}: {}\n", role.id, role.description));
        }
        prompt.push_str(&format!("\nQuestion:\n{}\n", utterance));
        prompt
    }

    /// System prompt for the planner's ordering call
    pub fn plan_system() -> &'static str {
        r#"You decide the order in which specialist advisors answer a question.
Advisors that produce facts other advisors depend on should go first.
Reply with JSON only, in the form {"order": ["role_id", ...], "reason": "one sentence"}."#
    }

    /// User prompt for the planner's ordering call
    pub fn plan_user(utterance: &str, roles: &[&Role]) -> String {
        let mut prompt = String::from("Advisors to order:\n");
        for role in roles {
            prompt.push_str(&format!("- {}: {}\n", role.id, role.description));
        }
        prompt.push_str(&format!("\nQuestion:\n{}\n", utterance));
        prompt
    }

    // ==================== Role passes ====================

    /// System prompt for one role pass
    pub fn role_system(role: &Role, attributes: &BTreeMap<String, String>) -> String {
        let mut prompt = role.prompt.trim().to_string();

        if !attributes.is_empty() {
            prompt.push_str("\n\nKnown facts about the user:\n");
            for (key, value) in attributes {
                prompt.push_str(&format!("- {}: {}\n", key, value));
            }
        }

        if !role.tools.is_empty() {
            prompt.push_str(&format!(
                "\n\nYou may call these tools: {}. Call a tool only with the parameters it declares.",
                role.tools.join(", ")
            ));
        }
        prompt
    }

    /// Findings of roles that already answered in this turn
    pub fn prior_findings(outputs: &[RoleOutput]) -> Option<String> {
        if outputs.is_empty() {
            return None;
        }
        let mut text =
            String::from("Other advisors have already answered this question:\n");
        for output in outputs {
            text.push_str(&format!("\n--- {} ---\n{}\n", output.name, output.content.trim()));
        }
        text.push_str("\nBuild on their findings instead of repeating them.");
        Some(text)
    }

    /// Instruction for the synthesis pass after sequential roles
    pub fn synthesis_instruction(utterance: &str) -> String {
        format!(
            r#"Merge the advisors' findings above into one answer to the user's question:

{}

Resolve disagreements explicitly, keep the key figures, and end with concrete next steps."#,
            utterance
        )
    }

    // ==================== Discussion ====================

    /// Prompt for one discussion statement
    pub fn discussion_statement(utterance: &str, round: u32, transcript: &str) -> String {
        if transcript.trim().is_empty() {
            return format!(
                r#"You are taking part in a panel discussion about this question:

{}

This is round {}. Give your initial position in a few sentences, focused on your own expertise."#,
                utterance, round
            );
        }
        format!(
            r#"You are taking part in a panel discussion about this question:

{}

Discussion so far:

{}
This is round {}. Respond to the other panelists: add new facts, correct mistakes, or state agreement.
Do not repeat what you already said. Keep it to a few sentences."#,
            utterance, transcript, round
        )
    }

    /// Yes/no question asked to the synthesis role after each round
    pub fn consensus_question(utterance: &str, transcript: &str) -> String {
        format!(
            r#"Question under discussion:

{}

Discussion so far:

{}
Is there enough information to conclude and give the user a final answer?
Reply with JSON only: {{"conclude": true}} or {{"conclude": false}}."#,
            utterance, transcript
        )
    }

    /// Instruction for the synthesis pass that closes a discussion
    pub fn discussion_synthesis(utterance: &str, transcript: &str, reason: &str) -> String {
        format!(
            r#"The panel discussion about the question below has ended ({}).

Question:

{}

Full transcript:

{}
Write the final answer for the user. Integrate the strongest points from every round,
state where the panel disagreed, and end with concrete next steps."#,
            reason, utterance, transcript
        )
    }
}
