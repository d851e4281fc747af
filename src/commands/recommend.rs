// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::analytics::{Severity, Trend, latest_trends};
use crate::config::{Config, GeminiConfig};
use crate::db::{new_id, now_stamp};
use crate::session;
use crate::utils::http_client;

pub const TITLE: &str = "AI Business Recommendation";
const ICON: &str = "🤖";

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    let user = session::require_user(conn)?;
    session::require_data_entry(&user)?;
    let trends = latest_trends(conn).context("Error fetching trends")?;
    tracing::info!(trends = trends.len(), "fetched trends for recommendation");

    let gemini = if m.get_flag("rule_based") {
        None
    } else {
        cfg.gemini.as_ref()
    };
    let rec = match gemini {
        Some(g) => {
            tracing::info!(model = %g.model, "generating recommendation with Gemini");
            generate_with_gemini(g, &trends)?
        }
        None => {
            tracing::info!("generating rule-based recommendation");
            rule_based_recommendation(&trends)
        }
    };
    save_recommendation(conn, &rec, &trends)?;
    println!("{} {}", ICON, TITLE);
    println!("   Insight: {}", rec.insight);
    println!("   Suggested Action: {}", rec.action);
    println!("   Expected Outcome: {}", rec.outcome);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceDraft {
    pub insight: String,
    pub action: String,
    pub outcome: String,
}

pub fn generate_prompt(trends: &[Trend]) -> String {
    if trends.is_empty() {
        return "Based on general restaurant business best practices, provide one actionable \
                business recommendation for a restaurant owner to improve profitability and \
                operational efficiency."
            .to_string();
    }
    let lines: Vec<String> = trends
        .iter()
        .map(|t| {
            let tag = match t.severity {
                Severity::High => "URGENT",
                Severity::Opportunity => "OPPORTUNITY",
                Severity::Medium => "TREND",
            };
            format!("{}: {}", tag, t.trend)
        })
        .collect();
    format!(
        "As a restaurant business consultant, analyze these market trends and provide strategic recommendations:

TRENDS IDENTIFIED:
{}

Based on these trends, provide ONE actionable business recommendation for a restaurant owner.

Your response should be structured as:
1. **Insight**: Brief explanation of the trend impact (1-2 sentences)
2. **Recommended Action**: Specific, actionable step the owner should take (1-2 sentences)
3. **Expected Outcome**: What positive result to expect from this action (1 sentence)

Keep your response concise, practical, and focused on immediate actionable steps.",
        lines.join("\n")
    )
}

/// Canned advice keyed on the most pressing trend: first high severity, then
/// first opportunity, then whatever came first.
pub fn rule_based_recommendation(trends: &[Trend]) -> AdviceDraft {
    let high = trends.iter().find(|t| t.severity == Severity::High);
    let opportunity = trends.iter().find(|t| t.severity == Severity::Opportunity);

    if let Some(t) = high {
        return AdviceDraft {
            insight: format!("{}. This is impacting your profit margins.", t.trend),
            action: format!(
                "Consider menu engineering: either adjust pricing for items using {} or temporarily feature alternative dishes with lower ingredient costs.",
                t.ingredient
            ),
            outcome: "Improved profit margins while maintaining customer satisfaction through strategic menu adjustments.".to_string(),
        };
    }
    if let Some(t) = opportunity {
        return AdviceDraft {
            insight: format!("{}. This is a chance to increase profitability.", t.trend),
            action: format!(
                "Create promotional campaigns featuring menu items that use {} to capitalize on lower costs and drive higher sales volume.",
                t.ingredient
            ),
            outcome: "Increased sales volume and customer engagement while ingredient costs are favorable.".to_string(),
        };
    }
    match trends.first() {
        Some(t) => AdviceDraft {
            insight: t.trend.clone(),
            action: format!(
                "Monitor {} closely and adjust purchasing strategies accordingly.",
                t.ingredient
            ),
            outcome: "Better inventory management and cost control through data-driven decision making.".to_string(),
        },
        None => AdviceDraft {
            insight: "No significant trends detected in recent data.".to_string(),
            action: "Continue monitoring key metrics and maintain current operational practices."
                .to_string(),
            outcome: "Stable business performance with early warning system in place.".to_string(),
        },
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Insight,
    Action,
    Outcome,
}

/// Split free-form model output into insight, action and outcome. A labelled
/// line opens a section; unlabelled lines continue the open one.
pub fn parse_response(text: &str) -> AdviceDraft {
    let mut insight = String::new();
    let mut action = String::new();
    let mut outcome = String::new();
    let mut current: Option<Section> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        let rest = line.split_once(':').map(|(_, r)| r.trim().to_string());
        let opened = match rest {
            Some(r) if lower.contains("insight") => Some((Section::Insight, r)),
            Some(r) if lower.contains("action") => Some((Section::Action, r)),
            Some(r) if lower.contains("outcome") => Some((Section::Outcome, r)),
            _ => None,
        };
        if let Some((section, body)) = opened {
            current = Some(section);
            match section {
                Section::Insight => insight = body,
                Section::Action => action = body,
                Section::Outcome => outcome = body,
            }
            continue;
        }
        if line.starts_with('*') {
            continue;
        }
        let target = match current {
            Some(Section::Insight) => &mut insight,
            Some(Section::Action) => &mut action,
            Some(Section::Outcome) => &mut outcome,
            None => continue,
        };
        target.push(' ');
        target.push_str(line);
    }

    fn or_default(s: String, d: &str) -> String {
        let t = s.trim();
        if t.is_empty() { d.to_string() } else { t.to_string() }
    }
    AdviceDraft {
        insight: or_default(insight, "Market trends indicate a need for strategic adjustments."),
        action: or_default(action, "Review your current menu and pricing strategy."),
        outcome: or_default(outcome, "Improved operational efficiency and profitability."),
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

pub fn generate_url(g: &GeminiConfig) -> String {
    format!(
        "{}/models/{}:generateContent",
        g.base_url.trim_end_matches('/'),
        g.model
    )
}

/// First candidate's text from a `generateContent` response body.
pub fn extract_text(body: &str) -> Result<String> {
    let resp: GenerateResponse =
        serde_json::from_str(body).context("Unexpected Gemini response")?;
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow!("Gemini returned no candidates"))
}

pub fn generate_with_gemini(g: &GeminiConfig, trends: &[Trend]) -> Result<AdviceDraft> {
    let prompt = generate_prompt(trends);
    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: &prompt }],
        }],
    };
    let client = http_client(g.timeout_secs)?;
    let resp = client
        .post(generate_url(g))
        .query(&[("key", g.api_key.as_str())])
        .json(&body)
        .send()
        .context("Error generating recommendation with Gemini")?
        .error_for_status()
        .context("Error generating recommendation with Gemini")?;
    let text = extract_text(&resp.text()?)?;
    Ok(parse_response(&text))
}

pub fn save_recommendation(conn: &Connection, rec: &AdviceDraft, trends: &[Trend]) -> Result<String> {
    let id = new_id();
    conn.execute(
        "INSERT INTO recommendations(id, title, insight, suggested_action, expected_outcome,
            source_trends, ai_generated, icon, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, 'ai_recommendation', ?8)",
        params![
            id,
            TITLE,
            rec.insight,
            rec.action,
            rec.outcome,
            serde_json::to_string(trends)?,
            ICON,
            now_stamp()
        ],
    )
    .context("Error saving recommendation")?;
    tracing::info!(id = %id, "saved AI recommendation");
    Ok(id)
}
