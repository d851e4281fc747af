// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use dinedash::commands::analytics::{Severity, Trend};
use dinedash::commands::{notifications, recommend};
use dinedash::config::Config;
use dinedash::models::Role;
use dinedash::{cli, db, session};
use rusqlite::Connection;

fn trend(ingredient: &str, severity: Severity, text: &str) -> Trend {
    Trend {
        ingredient: ingredient.into(),
        trend: text.into(),
        severity,
        correlation_strength: 0.8,
        action_needed: true,
    }
}

#[test]
fn prompt_tags_trends_by_severity() {
    let prompt = recommend::generate_prompt(&[
        trend("Chicken", Severity::High, "Chicken price up 25.0%, sales down 40.0%"),
        trend("Oil", Severity::Opportunity, "Oil price down 20.0%, opportunity to increase sales"),
        trend("Rice", Severity::Medium, "Rice price up 12.0%, sales down 3.0%"),
    ]);
    assert!(prompt.contains("URGENT: Chicken price up 25.0%"));
    assert!(prompt.contains("OPPORTUNITY: Oil price down 20.0%"));
    assert!(prompt.contains("TREND: Rice price up 12.0%"));
    assert!(prompt.contains("**Expected Outcome**"));

    let generic = recommend::generate_prompt(&[]);
    assert!(generic.contains("general restaurant business best practices"));
}

#[test]
fn fallback_prefers_high_then_opportunity() {
    let trends = vec![
        trend("Rice", Severity::Medium, "Rice price up 12.0%, sales down 3.0%"),
        trend("Oil", Severity::Opportunity, "Oil down"),
        trend("Chicken", Severity::High, "Chicken up"),
    ];
    let rec = recommend::rule_based_recommendation(&trends);
    assert_eq!(rec.insight, "Chicken up. This is impacting your profit margins.");
    assert!(rec.action.contains("items using Chicken"));

    let rec = recommend::rule_based_recommendation(&trends[..2]);
    assert!(rec.insight.ends_with("This is a chance to increase profitability."));
    assert!(rec.action.contains("use Oil"));

    let rec = recommend::rule_based_recommendation(&trends[..1]);
    assert_eq!(rec.insight, "Rice price up 12.0%, sales down 3.0%");
    assert!(rec.action.starts_with("Monitor Rice closely"));

    let rec = recommend::rule_based_recommendation(&[]);
    assert_eq!(rec.insight, "No significant trends detected in recent data.");
}

#[test]
fn parser_reads_labelled_sections_with_continuations() {
    let text = "1. **Insight**: Chicken costs are squeezing margins.\n\
                They rose a quarter in a month.\n\
                \n\
                2. **Recommended Action**: Reprice the bucket meals.\n\
                * ignored bullet\n\
                3. **Expected Outcome**: Margins recover within two weeks.";
    let rec = recommend::parse_response(text);
    assert_eq!(
        rec.insight,
        "Chicken costs are squeezing margins. They rose a quarter in a month."
    );
    assert_eq!(rec.action, "Reprice the bucket meals.");
    assert_eq!(rec.outcome, "Margins recover within two weeks.");
}

#[test]
fn parser_fills_missing_sections() {
    let rec = recommend::parse_response("Just buy cheaper chicken.");
    assert_eq!(rec.insight, "Market trends indicate a need for strategic adjustments.");
    assert_eq!(rec.action, "Review your current menu and pricing strategy.");
    assert_eq!(rec.outcome, "Improved operational efficiency and profitability.");
}

#[test]
fn gemini_response_text_is_extracted() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"Insight: x"}],"role":"model"}}]}"#;
    assert_eq!(recommend::extract_text(body).unwrap(), "Insight: x");
    assert!(recommend::extract_text(r#"{"candidates":[]}"#).is_err());

    let cfg = Config::from_lookup(|k| match k {
        "GEMINI_API_KEY" => Some("k".into()),
        "GEMINI_BASE_URL" => Some("http://localhost:9/v1/".into()),
        _ => None,
    });
    let g = cfg.gemini.unwrap();
    assert_eq!(
        recommend::generate_url(&g),
        "http://localhost:9/v1/models/gemini-1.5-flash:generateContent"
    );
}

#[test]
fn rule_based_run_saves_a_notification() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    session::create_user(&conn, None, "admin@diner.test", "secret1", &Role::Admin).unwrap();
    session::sign_in(&conn, "admin@diner.test", "secret1").unwrap();

    let cfg = Config::from_lookup(|_| None);
    let matches = cli::build_cli().get_matches_from(["dinedash", "recommend", "--rule-based"]);
    if let Some(("recommend", m)) = matches.subcommand() {
        recommend::handle(&conn, &cfg, m).unwrap();
    } else {
        panic!("no recommend subcommand");
    }

    let feed = notifications::latest(&conn, notifications::FEED_LIMIT).unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].title, recommend::TITLE);
    assert_eq!(feed[0].icon.as_deref(), Some("🤖"));
    let card = notifications::render_card(&feed[0]);
    assert!(card.contains("Insight: No significant trends detected"));
    assert!(card.contains("Expected Outcome: Stable business performance"));
}
