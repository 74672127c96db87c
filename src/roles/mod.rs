//! Role executors
//!
//! A role is a named persona (a director or a specialist) bound to a prompt
//! template and a typed response contract. Executing a role renders its
//! template, sends one structured request through the gateway and returns
//! the validated JSON answer. Executors never call each other.

pub mod actions;
pub mod contracts;
pub mod coordinator;
pub mod templates;

use crate::gateway::{invoke_validated, Contract, GatewayError, InvokeRequest, LlmGateway};
use async_trait::async_trait;
use contracts::*;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Director-level roles
///
/// Variants carry no doc comments so the generated schema stays a flat
/// string enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[allow(missing_docs)]
pub enum Director {
    #[serde(rename = "Business Operations Director")]
    BusinessOperations,
    #[serde(rename = "Creative & Content Director")]
    CreativeContent,
    #[serde(rename = "Technology & Security Director")]
    TechnologySecurity,
    #[serde(rename = "Personal Life Director")]
    PersonalLife,
    #[serde(rename = "Financial & Legal Director")]
    FinancialLegal,
    #[serde(rename = "Health & Wellness Director")]
    HealthWellness,
}

impl Director {
    /// Every director, in routing-prompt order
    pub const ALL: [Director; 6] = [
        Director::BusinessOperations,
        Director::CreativeContent,
        Director::TechnologySecurity,
        Director::PersonalLife,
        Director::FinancialLegal,
        Director::HealthWellness,
    ];

    /// Display name, as used in prompts and on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Director::BusinessOperations => "Business Operations Director",
            Director::CreativeContent => "Creative & Content Director",
            Director::TechnologySecurity => "Technology & Security Director",
            Director::PersonalLife => "Personal Life Director",
            Director::FinancialLegal => "Financial & Legal Director",
            Director::HealthWellness => "Health & Wellness Director",
        }
    }

    /// One-line remit shown to the router
    pub fn description(&self) -> &'static str {
        match self {
            Director::BusinessOperations => {
                "Handles sales, marketing, HR, operations, and project management."
            }
            Director::CreativeContent => {
                "Manages content creation, social media, design, branding."
            }
            Director::TechnologySecurity => {
                "Oversees cybersecurity, IT, software development, data."
            }
            Director::PersonalLife => {
                "Assists with daily tasks, travel, education, home management."
            }
            Director::FinancialLegal => {
                "Manages personal finance, investments, taxes, legal services."
            }
            Director::HealthWellness => "Focuses on medical, fitness, nutrition, mental health.",
        }
    }
}

impl fmt::Display for Director {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Specialist roles (agents and managers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Specialist {
    Seo,
    ViralContent,
    EmailMarketing,
    Instagram,
    TikTok,
    YouTube,
    LeadQualification,
    SalesNurturing,
    Closing,
    GraphicDesign,
    VideoScript,
    Presentation,
    CommunicationManager,
    ContentManager,
    ProjectManager,
    ResearchManager,
}

impl Specialist {
    /// Every specialist
    pub const ALL: [Specialist; 16] = [
        Specialist::Seo,
        Specialist::ViralContent,
        Specialist::EmailMarketing,
        Specialist::Instagram,
        Specialist::TikTok,
        Specialist::YouTube,
        Specialist::LeadQualification,
        Specialist::SalesNurturing,
        Specialist::Closing,
        Specialist::GraphicDesign,
        Specialist::VideoScript,
        Specialist::Presentation,
        Specialist::CommunicationManager,
        Specialist::ContentManager,
        Specialist::ProjectManager,
        Specialist::ResearchManager,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Specialist::Seo => "SEO Agent",
            Specialist::ViralContent => "Viral Content Agent",
            Specialist::EmailMarketing => "Email Marketing Agent",
            Specialist::Instagram => "Instagram Agent",
            Specialist::TikTok => "TikTok Agent",
            Specialist::YouTube => "YouTube Agent",
            Specialist::LeadQualification => "Lead Qualification Agent",
            Specialist::SalesNurturing => "Sales Nurturing Agent",
            Specialist::Closing => "Closing Agent",
            Specialist::GraphicDesign => "Graphic Design Agent",
            Specialist::VideoScript => "Video Script Agent",
            Specialist::Presentation => "Presentation Agent",
            Specialist::CommunicationManager => "Communication Manager",
            Specialist::ContentManager => "Content Manager",
            Specialist::ProjectManager => "Project Manager",
            Specialist::ResearchManager => "Research Manager",
        }
    }

    /// Whether this specialist coordinates sub-agents
    pub fn is_manager(&self) -> bool {
        matches!(
            self,
            Specialist::CommunicationManager
                | Specialist::ContentManager
                | Specialist::ProjectManager
                | Specialist::ResearchManager
        )
    }
}

/// Any executable role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A director
    Director(Director),
    /// A specialist agent or manager
    Specialist(Specialist),
}

/// Returned when a role name matches no known role
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRoleName(pub String);

impl Role {
    /// Every role: directors first, then specialists
    pub fn all() -> Vec<Role> {
        Director::ALL
            .into_iter()
            .map(Role::Director)
            .chain(Specialist::ALL.into_iter().map(Role::Specialist))
            .collect()
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Role::Director(director) => director.name(),
            Role::Specialist(specialist) => specialist.name(),
        }
    }

    /// "director", "manager" or "agent"
    pub fn kind(&self) -> &'static str {
        match self {
            Role::Director(_) => "director",
            Role::Specialist(s) if s.is_manager() => "manager",
            Role::Specialist(_) => "agent",
        }
    }
}

impl From<Director> for Role {
    fn from(director: Director) -> Self {
        Role::Director(director)
    }
}

impl From<Specialist> for Role {
    fn from(specialist: Specialist) -> Self {
        Role::Specialist(specialist)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::all()
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| UnknownRoleName(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Executes one role against the gateway
#[async_trait]
pub trait RoleExecutor: Send + Sync {
    /// The role this executor runs
    fn role(&self) -> Role;

    /// Run the role on `task` with `context` (any JSON, typically the
    /// results of earlier roles) and return the validated answer
    async fn execute(&self, task: &str, context: &Value) -> Result<Value, GatewayError>;
}

/// Executor that renders the role's prompt template and validates the
/// answer against contract `C`
pub struct TemplateExecutor<C> {
    role: Role,
    gateway: Arc<dyn LlmGateway>,
    _contract: PhantomData<fn() -> C>,
}

impl<C> TemplateExecutor<C> {
    /// Bind `role` to `gateway`
    pub fn new(role: Role, gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            role,
            gateway,
            _contract: PhantomData,
        }
    }
}

#[async_trait]
impl<C: Contract + 'static> RoleExecutor for TemplateExecutor<C> {
    fn role(&self) -> Role {
        self.role
    }

    async fn execute(&self, task: &str, context: &Value) -> Result<Value, GatewayError> {
        let prompt = templates::render(self.role, task, context);
        let request = InvokeRequest::structured::<C>(prompt)
            .with_internet_context(templates::uses_internet(self.role));

        tracing::debug!(role = %self.role, "Executing role");
        let result = invoke_validated::<C>(self.gateway.as_ref(), request).await;
        match &result {
            Ok(_) => tracing::debug!(role = %self.role, "Role completed"),
            Err(e) => tracing::warn!(role = %self.role, error = %e, "Role failed"),
        }
        result
    }
}

fn executor<C: Contract + 'static>(role: Role, gateway: Arc<dyn LlmGateway>) -> Arc<dyn RoleExecutor> {
    Arc::new(TemplateExecutor::<C>::new(role, gateway))
}

/// Build the production executor for `role`
pub fn executor_for(role: Role, gateway: Arc<dyn LlmGateway>) -> Arc<dyn RoleExecutor> {
    match role {
        Role::Director(_) => executor::<DirectorPlan>(role, gateway),
        Role::Specialist(specialist) => match specialist {
            Specialist::Seo => executor::<SeoReport>(role, gateway),
            Specialist::ViralContent => executor::<ViralContentPlan>(role, gateway),
            Specialist::EmailMarketing => executor::<EmailCampaign>(role, gateway),
            Specialist::Instagram => executor::<InstagramPost>(role, gateway),
            Specialist::TikTok => executor::<TikTokVideo>(role, gateway),
            Specialist::YouTube => executor::<YouTubeVideo>(role, gateway),
            Specialist::LeadQualification => executor::<LeadQualification>(role, gateway),
            Specialist::SalesNurturing => executor::<NurturePlan>(role, gateway),
            Specialist::Closing => executor::<ClosingPlan>(role, gateway),
            Specialist::GraphicDesign => executor::<DesignSpec>(role, gateway),
            Specialist::VideoScript => executor::<VideoScript>(role, gateway),
            Specialist::Presentation => executor::<PresentationOutline>(role, gateway),
            Specialist::CommunicationManager => executor::<CommunicationReport>(role, gateway),
            Specialist::ContentManager => executor::<ContentPiece>(role, gateway),
            Specialist::ProjectManager => executor::<ProjectReport>(role, gateway),
            Specialist::ResearchManager => executor::<ResearchReport>(role, gateway),
        },
    }
}

/// Lookup table from role to executor
#[derive(Clone, Default)]
pub struct RoleRegistry {
    executors: HashMap<Role, Arc<dyn RoleExecutor>>,
}

impl fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("roles", &self.roles())
            .finish()
    }
}

impl RoleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a template executor for every role
    pub fn with_gateway(gateway: Arc<dyn LlmGateway>) -> Self {
        let mut registry = Self::new();
        for role in Role::all() {
            registry.register(executor_for(role, gateway.clone()));
        }
        registry
    }

    /// Add or replace the executor for its role
    pub fn register(&mut self, executor: Arc<dyn RoleExecutor>) {
        self.executors.insert(executor.role(), executor);
    }

    /// Executor for `role`, if registered
    pub fn get(&self, role: Role) -> Option<Arc<dyn RoleExecutor>> {
        self.executors.get(&role).cloned()
    }

    /// Registered roles in canonical order
    pub fn roles(&self) -> Vec<Role> {
        Role::all()
            .into_iter()
            .filter(|role| self.executors.contains_key(role))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::offline::skeleton;
    use crate::gateway::{LlmResponse, ScriptedGateway};
    use serde_json::json;

    #[test]
    fn test_role_names_round_trip() {
        for role in Role::all() {
            assert_eq!(role.name().parse::<Role>().unwrap(), role);
        }
        assert_eq!(Role::all().len(), 22);
        assert_eq!(
            "Chief Vibes Director".parse::<Role>(),
            Err(UnknownRoleName("Chief Vibes Director".to_string()))
        );
    }

    #[test]
    fn test_director_serializes_as_display_name() {
        assert_eq!(
            serde_json::to_value(Director::CreativeContent).unwrap(),
            json!("Creative & Content Director")
        );
        assert!(serde_json::from_value::<Director>(json!("SEO Agent")).is_err());
    }

    #[tokio::test]
    async fn test_every_role_returns_contract_shaped_answer() {
        let gateway = ScriptedGateway::with_responder(|req| {
            let schema = req.response_json_schema.as_ref().expect("structured request");
            Ok(LlmResponse::Structured(skeleton(schema)))
        });
        let registry = RoleRegistry::with_gateway(Arc::new(gateway.clone()));

        for role in registry.roles() {
            let executor = registry.get(role).unwrap();
            let answer = executor.execute("do the thing", &json!([])).await.unwrap();

            let schema = gateway.requests().last().unwrap().response_json_schema.clone().unwrap();
            let expected: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
            let actual: Vec<&String> = answer.as_object().unwrap().keys().collect();
            assert_eq!(actual, expected, "{role}");
        }
        assert_eq!(gateway.call_count(), 22);
    }

    #[tokio::test]
    async fn test_role_prompt_carries_task_and_context() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({"hook": "Stop scrolling", "hashtags": ["#ai"]}));
        let executor = executor_for(Specialist::ViralContent.into(), Arc::new(gateway.clone()));

        let answer = executor
            .execute("Launch post", &json!([{"director_name": "x"}]))
            .await
            .unwrap();

        assert_eq!(answer["hook"], "Stop scrolling");
        let request = &gateway.requests()[0];
        assert!(request.prompt.contains("TASK: Launch post"));
        assert!(request.prompt.contains(r#"CONTEXT: [{"director_name":"x"}]"#));
        assert!(request.add_context_from_internet);
    }

    #[tokio::test]
    async fn test_wrongly_typed_answer_is_rejected() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({"qualification_score": "very high"}));
        let executor = executor_for(
            Specialist::LeadQualification.into(),
            Arc::new(gateway.clone()),
        );

        let result = executor.execute("Score Acme", &Value::Null).await;
        assert!(matches!(result, Err(GatewayError::SchemaViolation(_))));
    }
}
