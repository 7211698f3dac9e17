// src/notify/render.rs
use chrono::{DateTime, Local};

use crate::model::Announcement;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub subject: String,
    pub body: String,
}

pub fn subject_line(count: usize, prefix: Option<&str>) -> String {
    let noun = if count == 1 {
        "announcement"
    } else {
        "announcements"
    };
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => format!("{p} {count} new {noun} found"),
        None => format!("{count} new {noun} found"),
    }
}

/// Plain-text digest: banner, one block per item, totals and the check time.
pub fn render_summary(
    items: &[Announcement],
    prefix: Option<&str>,
    now: DateTime<Local>,
) -> Summary {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let mut body = String::new();
    body.push('\n');
    body.push_str(&heavy);
    body.push_str("\nNew announcements\n");
    body.push_str(&heavy);
    body.push_str("\n\n");

    for a in items {
        body.push_str(&format!("Title: {}\n", a.title));
        body.push_str(&format!("URL: {}\n", a.url));
        body.push_str(&format!("Published: {}\n", a.publish_date));
        if !a.matched_keywords.is_empty() {
            body.push_str(&format!(
                "Matched keywords: {}\n",
                a.matched_keywords.join(", ")
            ));
        }
        body.push_str(&light);
        body.push('\n');
    }

    body.push_str(&format!("\nTotal: {} new\n", items.len()));
    body.push_str(&format!("Checked at: {}\n", now.format("%Y-%m-%d %H:%M:%S")));

    Summary {
        subject: subject_line(items.len(), prefix),
        body,
    }
}
