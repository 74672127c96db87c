//! Agent coordinator: picks the specialist(s) best suited to a task

use crate::gateway::{invoke_typed, GatewayError, InvokeRequest, LlmGateway};
use crate::roles::contracts::AgentMatch;
use crate::roles::{Director, Role, Specialist};
use serde_json::Value;

/// Static expertise tags for `role`
pub fn agent_expertise(role: Role) -> &'static [&'static str] {
    match role {
        Role::Director(director) => match director {
            Director::BusinessOperations => {
                &["sales", "marketing", "HR", "operations", "project management"]
            }
            Director::CreativeContent => &["content creation", "social media", "design", "branding"],
            Director::TechnologySecurity => {
                &["cybersecurity", "IT", "software development", "data"]
            }
            Director::PersonalLife => &["daily tasks", "travel", "education", "home management"],
            Director::FinancialLegal => {
                &["personal finance", "investments", "taxes", "legal services"]
            }
            Director::HealthWellness => &["medical", "fitness", "nutrition", "mental health"],
        },
        Role::Specialist(specialist) => match specialist {
            Specialist::Seo => &["search optimization", "keywords", "ranking", "technical SEO"],
            Specialist::ViralContent => &["viral mechanics", "trending topics", "engagement"],
            Specialist::Instagram => &["visual content", "reels", "stories", "influencer marketing"],
            Specialist::TikTok => &["short video", "trending sounds", "Gen Z content"],
            Specialist::YouTube => &["long-form video", "video SEO", "monetization"],
            Specialist::LeadQualification => {
                &["lead scoring", "BANT framework", "prospect analysis"]
            }
            Specialist::SalesNurturing => &[
                "relationship building",
                "follow-up sequences",
                "objection handling",
            ],
            Specialist::Closing => &["negotiation", "deal closing", "contract finalization"],
            Specialist::GraphicDesign => &["visual design", "branding", "graphics"],
            Specialist::VideoScript => &["scriptwriting", "storyboarding", "video planning"],
            Specialist::EmailMarketing => &["email campaigns", "subject lines", "deliverability"],
            Specialist::Presentation => &["storytelling", "slide design", "data visualization"],
            Specialist::CommunicationManager => &["email", "messaging", "calendar management"],
            Specialist::ContentManager => &["blog posts", "social media content"],
            Specialist::ProjectManager => &["CRM", "documents", "project tracking"],
            Specialist::ResearchManager => &["web research", "competitive analysis"],
        },
    }
}

fn coordinator_prompt(task: &str, context: &Value) -> String {
    let agents: String = Specialist::ALL
        .iter()
        .map(|s| format!("- {}: {}\n", s.name(), agent_expertise((*s).into()).join(", ")))
        .collect();

    format!(
        "You are an AI agent coordinator. Given this task and context, determine which specialized agent(s) would be best suited to handle it.

TASK: {task}
CONTEXT: {context}

AVAILABLE AGENTS:
{agents}
Return the best agent(s) to handle this task."
    )
}

/// Ask the gateway which agent(s) should handle `task`
pub async fn find_best_agent(
    gateway: &dyn LlmGateway,
    task: &str,
    context: &Value,
) -> Result<AgentMatch, GatewayError> {
    let request = InvokeRequest::structured::<AgentMatch>(coordinator_prompt(task, context));
    let matched: AgentMatch = invoke_typed(gateway, request).await?;
    tracing::debug!(primary_agent = %matched.primary_agent, "Agent match found");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;
    use serde_json::json;

    #[test]
    fn test_every_role_has_expertise() {
        for role in Role::all() {
            assert!(!agent_expertise(role).is_empty(), "{role}");
        }
        assert!(agent_expertise(Specialist::Closing.into()).contains(&"negotiation"));
    }

    #[tokio::test]
    async fn test_find_best_agent_lists_all_specialists() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({
            "primary_agent": "TikTok Agent",
            "supporting_agents": ["Video Script Agent"],
            "reasoning": "short-form video",
            "collaboration_strategy": "script first"
        }));

        let matched = find_best_agent(&gateway, "Make a dance video", &json!({}))
            .await
            .unwrap();

        assert_eq!(matched.primary_agent, "TikTok Agent");
        assert_eq!(matched.supporting_agents, vec!["Video Script Agent"]);
        let prompt = &gateway.requests()[0].prompt;
        for specialist in Specialist::ALL {
            assert!(prompt.contains(specialist.name()));
        }
    }
}
