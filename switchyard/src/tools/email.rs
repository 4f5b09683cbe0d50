//! Email templates, a user directory and an outbox, with the tools the email
//! flow uses: `search_templates`, `find_relevant_user` and `send_email`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::tool_source::{ToolOutput, ToolSourceError, ToolSpec};
use crate::tools::{load_json, string_arg, AssetError, Tool};

pub const TOOL_SEARCH_TEMPLATES: &str = "search_templates";
pub const TOOL_FIND_RELEVANT_USER: &str = "find_relevant_user";
pub const TOOL_SEND_EMAIL: &str = "send_email";

/// Number of templates `search_templates` returns when `k` is not given.
pub const DEFAULT_TEMPLATE_RESULTS: usize = 5;

/// Template ids appear as numbers or strings in template files.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailTemplate {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub topic: String,
    pub subject: String,
    pub body: String,
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Templates searchable by keyword.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<EmailTemplate>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<EmailTemplate>) -> Self {
        Self { templates }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let templates: Vec<EmailTemplate> = load_json(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), templates = templates.len(), "email templates loaded");
        Ok(Self::new(templates))
    }

    pub fn templates(&self) -> &[EmailTemplate] {
        &self.templates
    }

    /// Top `k` templates by keyword score; a match in the topic counts three, in the
    /// subject two and in the body one. Templates without any match are dropped.
    pub fn search(&self, query: &str, k: usize) -> Vec<&EmailTemplate> {
        let terms = words(query);
        let mut scored: Vec<(usize, &EmailTemplate)> = self
            .templates
            .iter()
            .map(|t| {
                let (topic, subject, body) = (
                    t.topic.to_lowercase(),
                    t.subject.to_lowercase(),
                    t.body.to_lowercase(),
                );
                let score = terms
                    .iter()
                    .map(|w| {
                        3 * usize::from(topic.contains(w.as_str()))
                            + 2 * usize::from(subject.contains(w.as_str()))
                            + usize::from(body.contains(w.as_str()))
                    })
                    .sum();
                (score, t)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        // stable: equal scores keep file order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(k).map(|(_, t)| t).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        Ok(Self::new(load_json(path.as_ref())?))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Users whose name or email shares a word with `query`.
    pub fn find(&self, query: &str) -> Vec<&User> {
        let terms = words(query);
        self.users
            .iter()
            .filter(|u| {
                let hay = format!("{} {}", u.name, u.email).to_lowercase();
                terms.iter().any(|w| hay.contains(w.as_str()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    pub email: String,
    pub subject: String,
    pub body: String,
}

/// Records sent emails; nothing leaves the process.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: RwLock<Vec<SentEmail>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn send(&self, email: SentEmail) {
        self.sent.write().await.push(email);
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.read().await.clone()
    }
}

pub struct SearchTemplatesTool {
    library: Arc<TemplateLibrary>,
}

impl SearchTemplatesTool {
    pub fn new(library: Arc<TemplateLibrary>) -> Self {
        Self { library }
    }
}

#[async_trait]
impl Tool for SearchTemplatesTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_TEMPLATES
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEARCH_TEMPLATES.to_string(),
            description: Some("Searches the template store for fitting email templates.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The scenario the email is for." },
                    "k": { "type": "integer", "description": "Maximum number of templates to return." }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolOutput, ToolSourceError> {
        let query = string_arg(&args, "query")?;
        let k = match args.get("k") {
            None | Some(Value::Null) => DEFAULT_TEMPLATE_RESULTS,
            Some(v) => v
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| ToolSourceError::InvalidInput("k must be a positive integer".into()))?,
        };
        let hits = self.library.search(query, k);
        tracing::debug!(query, hits = hits.len(), "template search");
        let value = serde_json::to_value(&hits)
            .map_err(|e| ToolSourceError::Execution(e.to_string()))?;
        Ok(ToolOutput::json(&value, Default::default()))
    }
}

pub struct FindRelevantUserTool {
    directory: Arc<UserDirectory>,
}

impl FindRelevantUserTool {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for FindRelevantUserTool {
    fn name(&self) -> &str {
        TOOL_FIND_RELEVANT_USER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_FIND_RELEVANT_USER.to_string(),
            description: Some("Finds the relevant user for a given query.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Name or email of the recipient." }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolOutput, ToolSourceError> {
        let users = self.directory.find(string_arg(&args, "query")?);
        let value =
            serde_json::to_value(&users).map_err(|e| ToolSourceError::Execution(e.to_string()))?;
        Ok(ToolOutput::json(&value, Default::default()))
    }
}

pub struct SendEmailTool {
    outbox: Arc<Outbox>,
}

impl SendEmailTool {
    pub fn new(outbox: Arc<Outbox>) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        TOOL_SEND_EMAIL
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEND_EMAIL.to_string(),
            description: Some("Sends an email.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string" },
                    "subject": { "type": "string" },
                    "body": { "type": "string" }
                },
                "required": ["email", "subject", "body"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolOutput, ToolSourceError> {
        let sent = SentEmail {
            email: string_arg(&args, "email")?.to_string(),
            subject: string_arg(&args, "subject")?.to_string(),
            body: string_arg(&args, "body")?.to_string(),
        };
        let text = format!(
            "Email sent to {} with subject {} and body {}",
            sent.email, sent.subject, sent.body
        );
        tracing::info!(to = %sent.email, subject = %sent.subject, "email sent");
        self.outbox.send(sent).await;
        Ok(ToolOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> TemplateLibrary {
        TemplateLibrary::new(vec![
            EmailTemplate {
                id: "1".into(),
                topic: "Product recall".into(),
                subject: "Important: recall of your product".into(),
                body: "We are recalling the product you bought.".into(),
            },
            EmailTemplate {
                id: "2".into(),
                topic: "Welcome".into(),
                subject: "Welcome aboard".into(),
                body: "Thanks for joining. Your product ships soon.".into(),
            },
            EmailTemplate {
                id: "3".into(),
                topic: "Invoice".into(),
                subject: "Your invoice".into(),
                body: "Please find the invoice attached.".into(),
            },
        ])
    }

    /// **Scenario**: Topic matches outrank body-only matches; unrelated templates are dropped.
    #[test]
    fn search_scores_topic_above_body() {
        let lib = library();
        let hits = lib.search("product recall", 5);
        let ids: Vec<&str> = hits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn search_respects_k() {
        let lib = library();
        assert_eq!(lib.search("product recall", 1).len(), 1);
        assert!(lib.search("zzz", 5).is_empty());
    }

    #[test]
    fn numeric_ids_are_read_as_strings() {
        let t: Vec<EmailTemplate> =
            serde_json::from_str(r#"[{"id": 7, "topic": "t", "subject": "s", "body": "b"}]"#)
                .unwrap();
        assert_eq!(t[0].id, "7");
    }

    #[tokio::test]
    async fn search_tool_defaults_k_and_rejects_bad_k() {
        let tool = SearchTemplatesTool::new(Arc::new(library()));
        let out = tool.call(json!({"query": "your"})).await.unwrap();
        let v: Value = serde_json::from_str(out.content()).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 3);

        let err = tool.call(json!({"query": "x", "k": "two"})).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn find_relevant_user_matches_name() {
        let dir = Arc::new(UserDirectory::new(vec![User {
            id: "1".into(),
            email: "pollack.jan@gmail.com".into(),
            name: "Jan Pollack".into(),
        }]));
        let tool = FindRelevantUserTool::new(dir);
        let out = tool.call(json!({"query": "send it to Pollack"})).await.unwrap();
        let v: Value = serde_json::from_str(out.content()).unwrap();
        assert_eq!(v[0]["email"], "pollack.jan@gmail.com");

        let out = tool.call(json!({"query": "someone else"})).await.unwrap();
        assert_eq!(out.content(), "[]");
    }

    /// **Scenario**: send_email records the message and echoes it in the fixed format.
    #[tokio::test]
    async fn send_email_records_in_outbox() {
        let outbox = Arc::new(Outbox::new());
        let tool = SendEmailTool::new(outbox.clone());
        let out = tool
            .call(json!({"email": "a@b.c", "subject": "Hi", "body": "Hello"}))
            .await
            .unwrap();
        assert_eq!(out.content(), "Email sent to a@b.c with subject Hi and body Hello");
        assert_eq!(outbox.sent().await.len(), 1);
    }
}
