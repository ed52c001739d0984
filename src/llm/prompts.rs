/// Placeholder replaced by the caller's content.
pub const PLACEHOLDER: &str = "%s";

pub const RELEASE_NOTES_TEMPLATE: &str = r#"Please analyze these changes and create a concise, well-structured summary suitable for release notes:

%s

Please format the response as follows:
1. A brief overview (2-3 sentences)
2. Key changes (bullet points)
3. Impact on users/developers
"#;
