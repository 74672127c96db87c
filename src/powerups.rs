//! Power-up templates
//!
//! A power-up is a saved request with `{variable}` placeholders. Executing
//! one fills the placeholders and submits the text as a regular message.

use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder regex should be valid"));

/// Unique placeholder names, in order of first appearance
pub fn template_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = caps[1].trim().to_string();
        if !name.is_empty() && !variables.contains(&name) {
            variables.push(name);
        }
    }
    variables
}

/// Replace every placeholder with its input
///
/// Every variable must be supplied and non-empty.
pub fn render_template(
    template: &str,
    inputs: &HashMap<String, String>,
) -> Result<String, AppError> {
    let missing: Vec<String> = template_variables(template)
        .into_iter()
        .filter(|name| inputs.get(name).map_or(true, |v| v.trim().is_empty()))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Missing values for: {}",
            missing.join(", ")
        )));
    }

    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = caps[1].trim();
        inputs
            .get(name)
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_unique_in_order() {
        let vars = template_variables("Write a {tone} post about {topic} for {audience}, keep it {tone}");
        assert_eq!(vars, vec!["tone", "topic", "audience"]);
        assert!(template_variables("no placeholders").is_empty());
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let inputs = HashMap::from([
            ("tone".to_string(), "witty".to_string()),
            ("topic".to_string(), "Rust".to_string()),
        ]);
        let out = render_template("A {tone} take on {topic}. Stay {tone}.", &inputs).unwrap();
        assert_eq!(out, "A witty take on Rust. Stay witty.");
    }

    #[test]
    fn test_render_reports_missing_inputs() {
        let inputs = HashMap::from([("topic".to_string(), " ".to_string())]);
        let err = render_template("{topic} for {audience}", &inputs).unwrap_err();
        assert!(err.to_string().contains("topic, audience"));
    }
}
