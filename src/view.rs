//! Read-time projection of the collection: filter by view mode, then order
//! newest-first. Storage order is never touched.

use crate::model::Prompt;

/// Which subset of the collection a view shows. Passed explicitly per call;
/// there is no process-wide "current filter".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    /// Only prompts flagged as favorites.
    Favorites,
    /// Only prompts rated 4 or 5.
    TopRated,
}

/// Derive the displayed subset and ordering for a view mode.
///
/// The result is sorted descending by effective creation time (metadata stamp
/// if present, else the record's own, else the epoch) so the newest prompt
/// comes first. The sort is stable, so same-instant records keep their
/// storage order.
pub fn view(prompts: &[Prompt], mode: FilterMode) -> Vec<Prompt> {
    let mut shown: Vec<Prompt> = prompts
        .iter()
        .filter(|p| match mode {
            FilterMode::All => true,
            FilterMode::Favorites => p.is_favorite,
            FilterMode::TopRated => p.rating >= 4,
        })
        .cloned()
        .collect();

    shown.sort_by(|a, b| b.effective_created_at().cmp(&a.effective_created_at()));
    shown
}
