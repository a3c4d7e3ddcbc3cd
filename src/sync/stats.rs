//! Collection statistics for export documents: aggregate counts, the mean
//! rating, the dominant model tag, and the summed token-estimate range.

use serde::{Deserialize, Serialize};

use crate::model::Prompt;

/// Elementwise sum of every record's token estimate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenTotals {
    pub min: u64,
    pub max: u64,
}

/// Collection statistics embedded in every export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_prompts: usize,
    /// Mean of all ratings (unrated counts as 0), rounded to 2 decimals.
    pub average_rating: f64,
    /// Model tag with the most records; ties go to the first one encountered.
    /// `"N/A"` for an empty collection, `"Unknown"` buckets metadata-less
    /// records.
    pub most_used_model: String,
    pub total_notes: usize,
    pub favorites_count: usize,
    pub total_tokens_estimate: TokenTotals,
}

impl Statistics {
    pub fn compute(prompts: &[Prompt]) -> Self {
        if prompts.is_empty() {
            return Self {
                total_prompts: 0,
                average_rating: 0.0,
                most_used_model: "N/A".to_string(),
                total_notes: 0,
                favorites_count: 0,
                total_tokens_estimate: TokenTotals::default(),
            };
        }

        let total_rating: u64 = prompts.iter().map(|p| u64::from(p.rating)).sum();
        let average_rating = round2(total_rating as f64 / prompts.len() as f64);

        // Left-to-right scan; strict > keeps the first-encountered model on
        // ties.
        let mut model_counts: Vec<(&str, usize)> = Vec::new();
        for prompt in prompts {
            let model = prompt
                .metadata
                .as_ref()
                .map_or("Unknown", |m| m.model.as_str());
            match model_counts.iter_mut().find(|(name, _)| *name == model) {
                Some((_, count)) => *count += 1,
                None => model_counts.push((model, 1)),
            }
        }
        let most_used_model = model_counts
            .iter()
            .fold(("N/A", 0usize), |best, &(name, count)| {
                if count > best.1 {
                    (name, count)
                } else {
                    best
                }
            })
            .0
            .to_string();

        let mut totals = TokenTotals::default();
        for prompt in prompts {
            if let Some(meta) = &prompt.metadata {
                totals.min += meta.token_estimate.min;
                totals.max += meta.token_estimate.max;
            }
        }

        Self {
            total_prompts: prompts.len(),
            average_rating,
            most_used_model,
            total_notes: prompts.iter().map(|p| p.notes.len()).sum(),
            favorites_count: prompts.iter().filter(|p| p.is_favorite).count(),
            total_tokens_estimate: totals,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
