//! # Metadata Engine
//!
//! Computes token estimates and stamps model metadata for prompt content.
//!
//! The estimate is a deliberately cheap heuristic: a lower bound from the word
//! count and an upper bound from the character count. Code-like text packs
//! denser into tokens, so both bounds get a 1.3x multiplier when the caller
//! flags the content as code. The two bounds can cross for very short, wordy
//! text; callers treat the pair as advisory, not as a strict interval.

use chrono::Utc;

use crate::error::{Result, StashError};
use crate::model::{Confidence, Metadata, TokenEstimate, MODEL_NAME_MAX_CHARS};

/// Estimate the token range for a piece of text.
///
/// Empty text yields `{0, 0, High}`. Otherwise the lower bound is
/// `ceil(0.75 x words)` and the upper bound `ceil(0.25 x chars)`, both scaled
/// by 1.3 (rounded up) for code-like text. Confidence follows the range
/// midpoint: below 1000 is `High`, up to 5000 is `Medium`, above that `Low`.
pub fn estimate_tokens(text: &str, is_code: bool) -> TokenEstimate {
    if text.is_empty() {
        return TokenEstimate {
            min: 0,
            max: 0,
            confidence: Confidence::High,
        };
    }

    // Non-empty whitespace-only text still counts as one "word".
    let word_count = text.split_whitespace().count().max(1);
    let char_count = text.chars().count();

    let mut min = (0.75 * word_count as f64).ceil() as u64;
    let mut max = (0.25 * char_count as f64).ceil() as u64;

    if is_code {
        min = (min as f64 * 1.3).ceil() as u64;
        max = (max as f64 * 1.3).ceil() as u64;
    }

    let midpoint = (min + max) as f64 / 2.0;
    let confidence = if midpoint < 1000.0 {
        Confidence::High
    } else if midpoint <= 5000.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    TokenEstimate {
        min,
        max,
        confidence,
    }
}

/// Build metadata for a prompt: validated model name, creation/update stamps,
/// and the token estimate for its content.
pub fn track_model(name: &str, content: &str, is_code: bool) -> Result<Metadata> {
    validate_model_name(name)?;
    if content.is_empty() {
        return Err(StashError::Validation(
            "Content must be a non-empty string".to_string(),
        ));
    }

    let now = Utc::now();
    Ok(Metadata {
        model: name.trim().to_string(),
        created_at: now,
        updated_at: now,
        token_estimate: estimate_tokens(content, is_code),
    })
}

/// Return a copy of `metadata` with `updated_at` set to the current time.
///
/// Fails if the fresh timestamp would precede `created_at`, which indicates a
/// clock or ordering violation rather than anything the caller can fix.
pub fn update_timestamps(metadata: &Metadata) -> Result<Metadata> {
    let now = Utc::now();
    if now < metadata.created_at {
        return Err(StashError::Validation(
            "updatedAt must be greater than or equal to createdAt".to_string(),
        ));
    }

    Ok(Metadata {
        updated_at: now,
        ..metadata.clone()
    })
}

fn validate_model_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StashError::Validation(
            "Model name cannot be empty or only whitespace".to_string(),
        ));
    }
    if name.chars().count() > MODEL_NAME_MAX_CHARS {
        return Err(StashError::Validation(format!(
            "Model name cannot exceed {} characters",
            MODEL_NAME_MAX_CHARS
        )));
    }
    Ok(())
}
