//! Typed response contracts for role executors
//!
//! Each struct doubles as the JSON schema sent to the gateway (via
//! `schemars`) and as the validator for the answer. Fields default so a
//! partial answer still conforms; types are what gets enforced.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// SEO Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SeoReport {
    /// Overall analysis
    pub analysis: String,
    /// Prioritised recommendations
    pub recommendations: Vec<SeoRecommendation>,
    /// Target keywords
    pub keywords: Vec<String>,
    /// Expected ranking change
    pub estimated_ranking_improvement: String,
}

/// One SEO recommendation
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SeoRecommendation {
    /// What to do
    pub action: String,
    /// high / medium / low
    pub priority: String,
    /// Expected impact
    pub impact: String,
    /// Effort required
    pub effort: String,
}

/// Viral Content Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ViralContentPlan {
    /// Opening hook
    pub hook: String,
    /// Body of the content
    pub main_content: String,
    /// Elements expected to drive sharing
    pub viral_elements: Vec<String>,
    /// Hashtags
    pub hashtags: Vec<String>,
    /// When and where to post
    pub posting_strategy: String,
    /// Engagement forecast
    pub expected_engagement: String,
}

/// Email Marketing Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EmailCampaign {
    /// Candidate subject lines
    pub subject_lines: Vec<String>,
    /// Email body
    pub email_body: String,
    /// Call to action
    pub call_to_action: String,
    /// Merge fields used for personalisation
    pub personalization_tokens: Vec<String>,
    /// Audience segmentation
    pub segmentation_strategy: String,
    /// Follow-up emails
    pub follow_up_sequence: Vec<String>,
}

/// Instagram Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InstagramPost {
    /// Post caption
    pub caption: String,
    /// Visual concept
    pub visual_concept: String,
    /// Hashtags
    pub hashtags: Vec<String>,
    /// Best posting time
    pub posting_time: String,
    /// Engagement tactics
    pub engagement_strategy: String,
    /// Story ideas
    pub story_ideas: Vec<String>,
}

/// TikTok Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TikTokVideo {
    /// Video concept
    pub video_concept: String,
    /// First-seconds hook
    pub hook: String,
    /// Script
    pub script: String,
    /// Trending sounds to use
    pub trending_sounds: Vec<String>,
    /// Caption
    pub caption: String,
    /// Hashtags
    pub hashtags: Vec<String>,
}

/// YouTube Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct YouTubeVideo {
    /// Video title
    pub title: String,
    /// Description
    pub description: String,
    /// Tags
    pub tags: Vec<String>,
    /// Thumbnail concept
    pub thumbnail_concept: String,
    /// Full script
    pub video_script: String,
    /// Chapter timestamps
    pub timestamps: Vec<String>,
    /// SEO keywords
    pub seo_keywords: Vec<String>,
}

/// Lead temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum QualificationLevel {
    Hot,
    Warm,
    Cold,
    Unqualified,
}

/// Lead Qualification Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LeadQualification {
    /// Score from 0 to 100
    pub qualification_score: Option<f64>,
    /// Qualification bucket
    pub qualification_level: Option<QualificationLevel>,
    /// Analysis
    pub analysis: String,
    /// Warning signs
    pub red_flags: Vec<String>,
    /// Opportunities
    pub opportunities: Vec<String>,
    /// How to approach the lead
    pub recommended_approach: String,
    /// Next steps
    pub next_steps: Vec<String>,
}

/// Sales Nurturing Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NurturePlan {
    /// Scheduled touchpoints
    pub nurture_sequence: Vec<NurtureTouchpoint>,
    /// Personalisation hooks
    pub personalization_points: Vec<String>,
    /// Content to share
    pub content_recommendations: Vec<String>,
    /// Signals that trigger engagement
    pub engagement_triggers: Vec<String>,
}

/// One nurturing touchpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NurtureTouchpoint {
    /// Day offset
    pub day: Option<f64>,
    /// Channel used
    pub channel: String,
    /// Message
    pub message: String,
    /// Goal of the touchpoint
    pub goal: String,
}

/// Closing Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClosingPlan {
    /// Overall approach
    pub closing_approach: String,
    /// Prepared objection handling
    pub objection_responses: Vec<ObjectionResponse>,
    /// Value reinforcement
    pub value_reinforcement: String,
    /// Urgency elements
    pub urgency_elements: Vec<String>,
    /// Closing script
    pub closing_script: String,
    /// Upsell opportunities
    pub upsell_opportunities: Vec<String>,
}

/// Objection and answer pair
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ObjectionResponse {
    /// The objection
    pub objection: String,
    /// Suggested response
    pub response: String,
}

/// Graphic Design Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DesignSpec {
    /// Concept and rationale
    pub design_concept: String,
    /// Hex colours
    pub color_palette: Vec<String>,
    /// Typography choices
    pub typography: Typography,
    /// Layout structure
    pub layout_description: String,
    /// Visual elements needed
    pub visual_elements: Vec<String>,
    /// Technical specifications
    pub specifications: DesignSpecifications,
    /// Prompt for the image generator
    pub image_prompt: String,
}

/// Typography block of a design spec
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Typography {
    /// Primary font
    pub primary_font: String,
    /// Secondary font
    pub secondary_font: String,
    /// Size per text role
    pub sizes: Map<String, Value>,
}

/// Output specifications of a design spec
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DesignSpecifications {
    /// Dimensions
    pub dimensions: String,
    /// File format
    pub format: String,
    /// Resolution
    pub resolution: String,
}

/// Video Script Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct VideoScript {
    /// Title
    pub title: String,
    /// Hook
    pub hook: String,
    /// Script
    pub script: String,
    /// Visual cues
    pub visual_cues: Vec<String>,
    /// Runtime
    pub duration: String,
    /// Music style
    pub music_style: String,
    /// Text overlays
    pub text_overlays: Vec<String>,
    /// Call to action
    pub call_to_action: String,
}

/// Presentation Agent answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PresentationOutline {
    /// Deck title
    pub presentation_title: String,
    /// Audience
    pub target_audience: String,
    /// Key message
    pub key_message: String,
    /// Slide breakdown
    pub slides: Vec<Slide>,
    /// Visual theme
    pub design_theme: String,
    /// Colour scheme
    pub color_scheme: Vec<String>,
}

/// One slide of a presentation outline
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Slide {
    /// Position in the deck
    pub slide_number: Option<f64>,
    /// Slide title
    pub title: String,
    /// Slide content
    pub content: String,
    /// Visual concept
    pub visual_concept: String,
    /// Talking points
    pub talking_points: Vec<String>,
}

/// Action reported by a manager role
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ManagerAction {
    /// Sub-agent that acted
    pub sub_agent: String,
    /// What was done
    pub action: String,
    /// Outcome
    pub result: String,
    /// Free-form payload
    pub data: Map<String, Value>,
}

/// Communication Manager answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CommunicationReport {
    /// Actions taken by sub-agents
    pub actions_taken: Vec<ManagerAction>,
    /// Summary
    pub summary: String,
    /// Recommended follow-up
    pub next_steps: String,
}

/// Content Manager answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ContentPiece {
    /// The content itself
    pub content_created: CreatedContent,
    /// SEO keywords
    pub seo_keywords: Vec<String>,
    /// Hashtags
    pub hashtags: Vec<String>,
    /// Call to action
    pub call_to_action: String,
    /// Engagement prediction
    pub estimated_engagement: String,
}

/// Body of a content piece
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CreatedContent {
    /// Title
    pub title: String,
    /// Full text
    pub body: String,
    /// Target platform
    pub platform: String,
    /// Tone
    pub tone: String,
}

/// Project Manager answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProjectReport {
    /// Actions taken by sub-agents
    pub actions_taken: Vec<ManagerAction>,
    /// Links to created documents
    pub created_documents: Vec<String>,
    /// Updated records
    pub updated_records: Vec<String>,
    /// Summary
    pub summary: String,
}

/// Research Manager answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResearchReport {
    /// Executive summary
    pub research_summary: String,
    /// Key findings
    pub key_findings: Vec<String>,
    /// Raw material
    pub data_gathered: GatheredData,
    /// Recommended actions
    pub recommendations: String,
}

/// Sources, facts and insights gathered by research
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GatheredData {
    /// Sources consulted
    pub sources: Vec<String>,
    /// Facts
    pub facts: Vec<String>,
    /// Insights
    pub insights: Vec<String>,
}

/// Director answer: an execution plan for the director's team
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DirectorPlan {
    /// Director that produced the plan
    pub director_name: String,
    /// Managers involved
    pub assigned_managers: Vec<String>,
    /// Ordered steps
    pub execution_steps: Vec<DirectorPlanStep>,
    /// Expected outcomes
    pub expected_outcomes: Vec<String>,
}

/// One step of a director plan
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DirectorPlanStep {
    /// Manager responsible
    pub manager: String,
    /// Task for that manager
    pub task: String,
    /// Agents the manager needs
    pub agents_needed: Vec<String>,
}

/// Agent coordinator answer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AgentMatch {
    /// Best agent for the task
    pub primary_agent: String,
    /// Agents that should help
    pub supporting_agents: Vec<String>,
    /// Why these agents
    pub reasoning: String,
    /// How they should work together
    pub collaboration_strategy: String,
}
