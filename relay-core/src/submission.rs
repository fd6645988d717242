//! Inbound submission payload and its validated form.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_ATTACHMENT_NAME: &str = "attachment.bin";

/// Attachment as it arrives on the wire; `url` may be a data URI or a plain URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl AttachmentDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_ATTACHMENT_NAME)
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

/// Raw webhook body. Every field is optional here so that a missing field is
/// reported after the secret check rather than as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub brief: Option<String>,
    /// Integer or numeric string; absent means round 1.
    #[serde(default)]
    pub round: Option<Value>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDescriptor>,
    #[serde(default)]
    pub evaluation_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    Create,
    Update,
}

impl Round {
    pub fn number(self) -> u8 {
        match self {
            Round::Create => 1,
            Round::Update => 2,
        }
    }

    /// Coerces the wire value: JSON numbers (floats truncate toward zero) and
    /// integer strings are accepted.
    pub fn coerce(value: Option<&Value>) -> Result<Self> {
        let number = match value {
            None | Some(Value::Null) => 1,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => i,
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
                    .ok_or(RelayError::UnsupportedRound)?,
            },
            Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| RelayError::UnsupportedRound)?,
            Some(_) => return Err(RelayError::UnsupportedRound),
        };

        match number {
            1 => Ok(Round::Create),
            2 => Ok(Round::Update),
            _ => Err(RelayError::UnsupportedRound),
        }
    }
}

/// A submission that passed the shape checks and is ready for dispatch.
#[derive(Debug, Clone)]
pub struct Submission {
    pub email: String,
    pub task: String,
    pub brief: String,
    pub round: Round,
    pub nonce: Option<String>,
    pub attachments: Vec<AttachmentDescriptor>,
    pub evaluation_url: String,
}

impl SubmissionRequest {
    /// Checks round and required fields. The secret is verified separately and first.
    pub fn validate(&self) -> Result<Submission> {
        let round = Round::coerce(self.round.as_ref())?;

        Ok(Submission {
            email: required(&self.email, "email")?,
            task: required(&self.task, "task")?,
            brief: self.brief.clone().unwrap_or_default(),
            round,
            nonce: self.nonce.clone(),
            attachments: self.attachments.clone(),
            evaluation_url: required(&self.evaluation_url, "evaluation_url")?,
        })
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(RelayError::InvalidInput(format!("missing required field: {}", field))),
    }
}

/// Body of the 200 response; fixed at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub status: String,
    pub task: String,
    pub round: u8,
}

impl Acknowledgement {
    pub fn accepted(submission: &Submission) -> Self {
        Self {
            status: "accepted".to_string(),
            task: submission.task.clone(),
            round: submission.round.number(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> SubmissionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_round_coercion() {
        assert_eq!(Round::coerce(None).unwrap(), Round::Create);
        assert_eq!(Round::coerce(Some(&json!(2))).unwrap(), Round::Update);
        assert_eq!(Round::coerce(Some(&json!("1"))).unwrap(), Round::Create);
        assert_eq!(Round::coerce(Some(&json!(" 2 "))).unwrap(), Round::Update);
        assert!(matches!(Round::coerce(Some(&json!(3))), Err(RelayError::UnsupportedRound)));
        assert!(matches!(Round::coerce(Some(&json!(0))), Err(RelayError::UnsupportedRound)));
        assert!(matches!(Round::coerce(Some(&json!("two"))), Err(RelayError::UnsupportedRound)));
        assert_eq!(Round::coerce(Some(&json!(1.0))).unwrap(), Round::Create);
        assert_eq!(Round::coerce(Some(&json!(2.0))).unwrap(), Round::Update);
        assert_eq!(Round::coerce(Some(&json!(2.9))).unwrap(), Round::Update);
        assert!(matches!(Round::coerce(Some(&json!(3.0))), Err(RelayError::UnsupportedRound)));
        assert!(matches!(Round::coerce(Some(&json!(0.5))), Err(RelayError::UnsupportedRound)));
        assert!(matches!(Round::coerce(Some(&json!("1.5"))), Err(RelayError::UnsupportedRound)));
        assert!(matches!(Round::coerce(Some(&json!([1]))), Err(RelayError::UnsupportedRound)));
    }

    #[test]
    fn test_validate_full_request() {
        let request = parse(json!({
            "secret": "s",
            "email": "student@example.com",
            "task": "captcha-solver",
            "brief": "Solve it",
            "round": "2",
            "nonce": "ab12",
            "attachments": [{"name": "sample.png", "url": "data:image/png;base64,AAAA"}],
            "evaluation_url": "https://eval.example.com/notify"
        }));

        let submission = request.validate().unwrap();
        assert_eq!(submission.round, Round::Update);
        assert_eq!(submission.task, "captcha-solver");
        assert_eq!(submission.attachments.len(), 1);
        assert_eq!(submission.nonce.as_deref(), Some("ab12"));
    }

    #[test]
    fn test_validate_missing_fields() {
        let request = parse(json!({"secret": "s", "task": "t", "evaluation_url": "http://x"}));
        let err = request.validate().unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(ref m) if m.contains("email")));

        let request = parse(json!({"email": "e", "task": "t", "evaluation_url": "  "}));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_unsupported_round_checked_before_fields() {
        let request = parse(json!({"round": 7}));
        assert!(matches!(request.validate(), Err(RelayError::UnsupportedRound)));
    }

    #[test]
    fn test_attachment_defaults() {
        let attachment: AttachmentDescriptor = serde_json::from_value(json!({})).unwrap();
        assert_eq!(attachment.name(), "attachment.bin");
        assert_eq!(attachment.url(), "");
    }

    #[test]
    fn test_acknowledgement_shape() {
        let request = parse(json!({"email": "e", "task": "t", "round": 1, "evaluation_url": "http://x"}));
        let ack = Acknowledgement::accepted(&request.validate().unwrap());
        assert_eq!(
            serde_json::to_value(ack).unwrap(),
            json!({"status": "accepted", "task": "t", "round": 1})
        );
    }
}
