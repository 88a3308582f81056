use crate::error::NotifyError;
use crate::lint::ScoreResult;
use crate::report::{ReportEntry, ReportSummary, SpecStatus};
use serde_json::{Value, json};
use tracing::{debug, info};

const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ADAPTIVE_CARD_VERSION: &str = "1.4";

/// Score of one spec, as announced to the channel
#[derive(Debug, Clone)]
pub struct SpecScoreCard<'a> {
    pub name: &'a str,
    pub result: &'a ScoreResult,
    pub threshold: u32,
}

fn wrap_card(body: Vec<Value>) -> Value {
    json!({
        "type": "message",
        "attachments": [{
            "contentType": ADAPTIVE_CARD_CONTENT_TYPE,
            "content": {
                "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                "type": "AdaptiveCard",
                "version": ADAPTIVE_CARD_VERSION,
                "body": body,
            }
        }]
    })
}

fn fact(title: &str, value: impl Into<String>) -> Value {
    json!({ "title": title, "value": value.into() })
}

fn status_color(passed: bool) -> &'static str {
    if passed { "good" } else { "attention" }
}

/// Card announcing the score of a single spec
pub fn single_payload(card: &SpecScoreCard<'_>) -> Value {
    let passed = card.result.passes(card.threshold);
    let status = if passed { SpecStatus::Pass } else { SpecStatus::Fail };

    let mut facts = vec![
        fact("Spec", card.name),
        fact("Score", format!("{}/100", card.result.score)),
        fact("Status", status.as_str()),
        fact("Violations", card.result.violation_count.to_string()),
        fact("Threshold", card.threshold.to_string()),
    ];
    if let Some(error) = &card.result.error {
        facts.push(fact("Error", error.as_str()));
    }

    wrap_card(vec![
        json!({
            "type": "TextBlock",
            "size": "Large",
            "weight": "Bolder",
            "text": format!("API Governance: {}", card.name),
        }),
        json!({
            "type": "TextBlock",
            "color": status_color(passed),
            "weight": "Bolder",
            "text": format!("{} ({}/100)", status.as_str(), card.result.score),
        }),
        json!({ "type": "FactSet", "facts": facts }),
    ])
}

/// Card summarising a whole report, listing at most `max_detail_lines` specs
pub fn batch_payload(report: &[ReportEntry], threshold: u32, max_detail_lines: usize) -> Value {
    let summary = ReportSummary::from_entries(report);

    let mut lines: Vec<String> = report
        .iter()
        .take(max_detail_lines)
        .map(|e| {
            let mut line = format!("- {} {}: {}/100", e.status.as_str(), e.name, e.score);
            if let Some(error) = &e.error {
                line.push_str(&format!(" ({})", error));
            }
            line
        })
        .collect();
    if report.len() > max_detail_lines {
        lines.push(format!("…and {} more", report.len() - max_detail_lines));
    }

    let mut body = vec![
        json!({
            "type": "TextBlock",
            "size": "Large",
            "weight": "Bolder",
            "text": "API Governance Report",
        }),
        json!({
            "type": "FactSet",
            "facts": [
                fact("Specs", summary.total.to_string()),
                fact("Passed", summary.passed.to_string()),
                fact("Failed", summary.failed.to_string()),
                fact("Average score", format!("{:.1}", summary.average_score)),
                fact("Threshold", threshold.to_string()),
            ],
        }),
    ];
    if !lines.is_empty() {
        body.push(json!({
            "type": "TextBlock",
            "wrap": true,
            "text": lines.join("\n"),
        }));
    }
    wrap_card(body)
}

/// Posts cards to a chat webhook
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
        }
    }

    /// Deliver a payload; success is any 2xx response
    pub async fn post(&self, payload: &Value) -> Result<(), NotifyError> {
        debug!("Posting notification to webhook");
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!("Notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_of, serve};
    use crate::types::SeverityCounts;

    fn card_body(payload: &Value) -> &Vec<Value> {
        payload["attachments"][0]["content"]["body"].as_array().unwrap()
    }

    fn entry(i: usize) -> ReportEntry {
        ReportEntry {
            name: format!("spec-{}", i),
            id: format!("id-{}", i),
            score: 80,
            violations_count: 2,
            status: SpecStatus::Pass,
            error: None,
        }
    }

    #[test]
    fn test_single_payload_facts() {
        let result = ScoreResult::from_violations(SeverityCounts::new(4, 0, 0, 0).to_violations());
        let payload = single_payload(&SpecScoreCard {
            name: "Pets",
            result: &result,
            threshold: 70,
        });

        assert_eq!(payload["type"], "message");
        assert_eq!(
            payload["attachments"][0]["contentType"],
            ADAPTIVE_CARD_CONTENT_TYPE
        );
        let body = card_body(&payload);
        assert_eq!(body[1]["text"], "FAIL (60/100)");
        assert_eq!(body[1]["color"], "attention");
        let facts = body[2]["facts"].as_array().unwrap();
        assert!(facts.iter().any(|f| f["title"] == "Score" && f["value"] == "60/100"));
        assert!(!facts.iter().any(|f| f["title"] == "Error"));
    }

    #[test]
    fn test_single_payload_includes_error() {
        let result = ScoreResult::failed("Invalid specification: couldn't parse");
        let payload = single_payload(&SpecScoreCard {
            name: "Broken",
            result: &result,
            threshold: 0,
        });
        let facts = card_body(&payload)[2]["facts"].as_array().unwrap();
        assert!(facts.iter().any(|f| f["title"] == "Error"));
        assert_eq!(card_body(&payload)[1]["text"], "FAIL (0/100)");
    }

    #[test]
    fn test_batch_payload_caps_detail_lines() {
        let report: Vec<ReportEntry> = (0..13).map(entry).collect();
        let payload = batch_payload(&report, 70, 10);
        let body = card_body(&payload);
        let text = body[2]["text"].as_str().unwrap();
        assert_eq!(text.lines().count(), 11);
        assert!(text.contains("spec-9"));
        assert!(!text.contains("spec-10"));
        assert!(text.ends_with("…and 3 more"));
        let facts = body[1]["facts"].as_array().unwrap();
        assert_eq!(facts[0]["value"], "13");
        assert_eq!(facts[3]["value"], "80.0");
    }

    #[test]
    fn test_batch_payload_without_entries() {
        let payload = batch_payload(&[], 70, 10);
        assert_eq!(card_body(&payload).len(), 2);
    }

    #[tokio::test]
    async fn test_post_delivers_payload() {
        let (base, requests) = serve(vec![(200, "1")]).await;
        let notifier = Notifier::new(&format!("{}/webhook", base));
        let payload = batch_payload(&[entry(1)], 70, 10);
        notifier.post(&payload).await.unwrap();

        let requests = requests.lock().unwrap();
        assert!(requests[0].starts_with("POST /webhook HTTP/1.1"));
        let sent: Value = serde_json::from_str(body_of(&requests[0])).unwrap();
        assert_eq!(sent, payload);
    }

    #[tokio::test]
    async fn test_post_reports_non_success_status() {
        let (base, _) = serve(vec![(500, "webhook down")]).await;
        let err = Notifier::new(&base)
            .post(&json!({"text": "hello"}))
            .await
            .unwrap_err();
        match err {
            NotifyError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "webhook down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
