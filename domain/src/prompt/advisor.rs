//! System prompts for the four advisory domains

use crate::agent::entities::AgentDomain;

/// Per-domain system prompt builder
pub struct AdvisorPrompt;

impl AdvisorPrompt {
    /// Domain-specific system prompt for the draft phase
    pub fn system(domain: AgentDomain) -> &'static str {
        match domain {
            AgentDomain::Legal => {
                r#"You are a startup legal advisor. You help founders understand contracts,
equity structures, regulatory obligations, and incorporation questions.
Ground every claim in the supplied context where possible. Flag jurisdiction-specific
caveats explicitly. You provide general guidance, not formal legal advice."#
            }
            AgentDomain::Finance => {
                r#"You are a startup finance advisor. You help founders with runway planning,
unit economics, fundraising math, and financial modeling.
Show your arithmetic when you derive figures. Prefer ranges over false precision.
Ground every claim in the supplied context where possible."#
            }
            AgentDomain::Investor => {
                r#"You are a startup fundraising advisor. You help founders understand investor
expectations, pitch positioning, term sheets, and round dynamics.
Be candid about weaknesses an investor would probe. Ground every claim in the
supplied context where possible."#
            }
            AgentDomain::Competitor => {
                r#"You are a competitive intelligence analyst for startups. You map competitive
landscapes, positioning gaps, and differentiation strategy.
Distinguish clearly between facts from the supplied research and your own inference.
Never fabricate competitor facts."#
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_domain_has_a_prompt() {
        for domain in AgentDomain::all() {
            assert!(!AdvisorPrompt::system(domain).is_empty());
        }
    }

    #[test]
    fn test_prompts_are_distinct() {
        let prompts: Vec<&str> = AgentDomain::all()
            .iter()
            .map(|d| AdvisorPrompt::system(*d))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
