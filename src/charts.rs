// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Declarative chart series. They print as text bars in the terminal or
//! serialize as JSON for an external charting front end.

use serde::Serialize;

use crate::utils::pretty_table;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Shown instead of (or under) the chart, e.g. "No prediction data yet".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Chart {
    pub fn new(id: &'static str, title: impl Into<String>, kind: ChartKind) -> Self {
        Chart {
            id,
            title: title.into(),
            kind,
            labels: Vec::new(),
            datasets: Vec::new(),
            status: None,
        }
    }

    pub fn single(
        id: &'static str,
        title: impl Into<String>,
        kind: ChartKind,
        series_label: impl Into<String>,
        labels: Vec<String>,
        values: Vec<f64>,
    ) -> Self {
        let mut c = Chart::new(id, title, kind);
        c.labels = labels;
        c.datasets.push(Dataset {
            label: series_label.into(),
            data: values.into_iter().map(Some).collect(),
        });
        c
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Values of the first dataset, with gaps as zero.
    pub fn values(&self) -> Vec<f64> {
        self.datasets
            .first()
            .map(|d| d.data.iter().map(|v| v.unwrap_or(0.0)).collect())
            .unwrap_or_default()
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n", self.title);
        if !self.is_empty() {
            let max = self
                .datasets
                .iter()
                .flat_map(|d| d.data.iter().flatten())
                .fold(0.0_f64, |m, v| m.max(v.abs()));
            let mut headers: Vec<&str> = vec!["Label"];
            headers.extend(self.datasets.iter().map(|d| d.label.as_str()));
            if self.datasets.len() == 1 {
                headers.push("");
            }
            let rows: Vec<Vec<String>> = self
                .labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let mut row = vec![label.clone()];
                    for d in &self.datasets {
                        row.push(match d.data.get(i).copied().flatten() {
                            Some(v) => format!("{:.2}", v),
                            None => "-".to_string(),
                        });
                    }
                    if self.datasets.len() == 1 {
                        let v = self.datasets[0].data.get(i).copied().flatten().unwrap_or(0.0);
                        row.push(bar(v, max));
                    }
                    row
                })
                .collect();
            out.push_str(&pretty_table(&headers, rows).to_string());
            out.push('\n');
        }
        if let Some(s) = &self.status {
            out.push_str(s);
            out.push('\n');
        }
        out
    }
}

fn bar(v: f64, max: f64) -> String {
    if max <= 0.0 || v <= 0.0 {
        return String::new();
    }
    let n = ((v / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(n.max(1))
}
