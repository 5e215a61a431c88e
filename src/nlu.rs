//! # Problem Parsing
//!
//! The boundary to the natural-language collaborator that turns a problem
//! statement into knowns and one unknown. The engine only depends on
//! [`ProblemParser`]; [`JsonProblemParser`] adapts any text-completion
//! model that answers in the JSON wire shape.

use async_trait::async_trait;

use crate::model::ParsedProblem;
use crate::{Error, Result};

/// Free text → knowns and unknown.
#[async_trait]
pub trait ProblemParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedProblem>;
}

/// A chat/completion model: system prompt plus user message in, reply out.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Instructions sent with every problem.
pub const EXTRACTION_PROMPT: &str = r#"You are a physics problem analysis assistant. Extract every known physical quantity (with its value and unit) and the single unknown quantity the user asks for.
Reply with JSON only, in exactly this shape:
{
  "knowns": [
    { "name": "standard quantity name", "value": 0, "unit": "unit", "type": "semantic type", "subType": "optional refinement", "direction": "optional direction" }
  ],
  "unknown": "standard name of the unknown quantity"
}
Use "type": "force" for every force and give its direction when the problem states one."#;

/// [`ProblemParser`] over a [`CompletionModel`] replying in JSON.
pub struct JsonProblemParser<M> {
    model: M,
}

impl<M: CompletionModel> JsonProblemParser<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

#[async_trait]
impl<M: CompletionModel> ProblemParser for JsonProblemParser<M> {
    async fn parse(&self, text: &str) -> Result<ParsedProblem> {
        let reply = self.model.complete(EXTRACTION_PROMPT, text).await?;
        let problem = ParsedProblem::from_json(strip_code_fence(&reply))
            .map_err(|e| Error::ParserError(format!("unreadable reply: {e}")))?;
        if problem.unknown.trim().is_empty() {
            return Err(Error::ParserError("reply names no unknown quantity".into()));
        }
        Ok(problem)
    }
}

/// Models often wrap JSON in a Markdown fence; keep what is inside.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else { return trimmed };
    // drop the info string ("json") on the opening line
    let body = body.split_once('\n').map_or("", |(_, rest)| rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl CompletionModel for Canned {
        async fn complete(&self, system: &str, _user: &str) -> Result<String> {
            assert!(system.contains("\"knowns\""));
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{}\n```\n"), "{}");
    }

    #[tokio::test]
    async fn test_parse_fenced_reply() {
        let parser = JsonProblemParser::new(Canned(
            "```json\n{\"knowns\": [{\"name\": \"mass\", \"value\": 10, \"unit\": \"kg\"}], \"unknown\": \"force\"}\n```",
        ));
        let problem = parser.parse("A 10 kg body accelerates at 2 m/s^2.").await.unwrap();
        assert_eq!(problem.unknown, "force");
        assert_eq!(problem.knowns.len(), 1);
        assert_eq!(problem.knowns[0].value, 10.0);
    }

    #[tokio::test]
    async fn test_unreadable_reply() {
        let parser = JsonProblemParser::new(Canned("I could not understand the problem."));
        let err = parser.parse("???").await.unwrap_err();
        assert!(matches!(err, Error::ParserError(_)));
    }

    #[tokio::test]
    async fn test_reply_without_unknown() {
        let parser = JsonProblemParser::new(Canned("{\"knowns\": [], \"unknown\": \" \"}"));
        assert!(matches!(parser.parse("x").await, Err(Error::ParserError(_))));
    }
}
