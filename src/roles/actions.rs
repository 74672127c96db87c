//! Side operations of specialist roles that do not go through the LLM
//!
//! Each returns a success flag with either the created record or the error
//! text; none of them fail the caller.

use crate::gateway::ImageGenerator;
use crate::roles::contracts::DesignSpec;
use crate::store::models::{Contact, ContentCalendarEntry, NewContact, NewContentEntry};
use crate::store::Store;
use serde::Serialize;

/// Result of a graphic design image request
#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    /// Whether an image was produced
    pub success: bool,
    /// Image location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The spec the image was generated from
    pub design_spec: DesignSpec,
}

/// Result of adding a content calendar entry
#[derive(Debug, Clone, Serialize)]
pub struct CalendarOutcome {
    /// Whether the entry was stored
    pub success: bool,
    /// Stored entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<ContentCalendarEntry>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of adding a CRM contact
#[derive(Debug, Clone, Serialize)]
pub struct ContactOutcome {
    /// Whether the contact was stored
    pub success: bool,
    /// Stored contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Graphic Design Agent: render the spec's image prompt
///
/// Uses `image_prompt`, or `design_concept` when the prompt is empty.
pub async fn generate_image(generator: &dyn ImageGenerator, design_spec: DesignSpec) -> ImageOutcome {
    let prompt = if design_spec.image_prompt.trim().is_empty() {
        design_spec.design_concept.clone()
    } else {
        design_spec.image_prompt.clone()
    };

    if prompt.trim().is_empty() {
        return ImageOutcome {
            success: false,
            image_url: None,
            error: Some("design spec has neither image_prompt nor design_concept".to_string()),
            design_spec,
        };
    }

    match generator.generate(&prompt).await {
        Ok(image) => ImageOutcome {
            success: true,
            image_url: Some(image.url),
            error: None,
            design_spec,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Image generation failed");
            ImageOutcome {
                success: false,
                image_url: None,
                error: Some(e.to_string()),
                design_spec,
            }
        }
    }
}

/// Content Manager: schedule a piece of content
pub async fn add_to_content_calendar(store: &Store, entry: NewContentEntry) -> CalendarOutcome {
    match store.create_content_entry(entry).await {
        Ok(entry) => CalendarOutcome {
            success: true,
            entry: Some(entry),
            error: None,
        },
        Err(e) => CalendarOutcome {
            success: false,
            entry: None,
            error: Some(e.to_string()),
        },
    }
}

/// Project Manager: add a contact to the CRM
pub async fn add_contact(store: &Store, contact: NewContact) -> ContactOutcome {
    match store.create_contact(contact).await {
        Ok(contact) => ContactOutcome {
            success: true,
            contact: Some(contact),
            error: None,
        },
        Err(e) => ContactOutcome {
            success: false,
            contact: None,
            error: Some(e.to_string()),
        },
    }
}
