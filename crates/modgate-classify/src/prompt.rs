//! Prompt construction for the moderation taxonomy
//!
//! The prompts fix the five-way classification taxonomy and instruct the
//! model to embed a machine-readable JSON object in its reply. The parser
//! in [`crate::verdict`] tolerates the object appearing anywhere in the
//! response text.

/// Build the moderation prompt for text content.
pub fn text_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text for inappropriate content. Classify it into one of these categories:
- safe: Appropriate and harmless content
- toxic: Hate speech, offensive language, or harmful content
- spam: Unwanted promotional content, scams, or repetitive messages
- harassment: Bullying, threats, or targeted abuse
- inappropriate: Content that violates community guidelines but isn't clearly toxic or spam

Text to analyze: "{text}"

Respond in the following JSON format:
{{
    "classification": "safe|toxic|spam|harassment|inappropriate",
    "confidence": 0.0-1.0,
    "reasoning": "Brief explanation of the classification",
    "flagged": true/false
}}

Be thorough but fair in your analysis. Consider context and intent."#
    )
}

/// Build the moderation prompt for image content.
pub fn image_prompt(hint: &str) -> String {
    format!(
        r#"Analyze this image for inappropriate content. Classify it into one of these categories:
- safe: Appropriate and harmless content
- toxic: Hate speech, offensive symbols, or harmful imagery
- spam: Unwanted promotional content or misleading imagery
- harassment: Bullying imagery, threats, or targeted abuse
- inappropriate: Content that violates community guidelines (nudity, violence, etc.)

Image description: {hint}

Respond in the following JSON format:
{{
    "classification": "safe|toxic|spam|harassment|inappropriate",
    "confidence": 0.0-1.0,
    "reasoning": "Brief explanation of the classification",
    "flagged": true/false
}}

Be thorough but fair in your analysis. Consider context and cultural sensitivity."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_names_all_labels() {
        let prompt = text_prompt("sample");
        for label in ["safe", "toxic", "spam", "harassment", "inappropriate"] {
            assert!(prompt.contains(label), "missing label {label}");
        }
        assert!(prompt.contains("sample"));
    }

    #[test]
    fn test_image_prompt_includes_hint() {
        let prompt = image_prompt("Image from URL: https://example.com/x.png");
        assert!(prompt.contains("https://example.com/x.png"));
        assert!(prompt.contains("classification"));
    }
}
