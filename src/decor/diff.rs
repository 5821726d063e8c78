//! Provider-set diffing by view identity.

use std::collections::BTreeSet;

use super::provider::{DecorProvider, ViewId};

/// Collect the view ids of a provider list.
pub fn view_ids<'a>(providers: impl IntoIterator<Item = &'a DecorProvider>) -> BTreeSet<ViewId> {
    providers.into_iter().map(DecorProvider::view_id).collect()
}

/// Whether two provider lists describe the same views.
///
/// Order and duplicates are ignored; geometry is not compared. Two
/// empty lists are the same.
pub fn has_same_providers(previous: &[DecorProvider], candidate: &[DecorProvider]) -> bool {
    view_ids(previous) == view_ids(candidate)
}

/// [`has_same_providers`] against a bare id list.
pub fn has_same_view_ids(previous: &BTreeSet<ViewId>, candidate: &[ViewId]) -> bool {
    let candidate: BTreeSet<ViewId> = candidate.iter().copied().collect();
    *previous == candidate
}
