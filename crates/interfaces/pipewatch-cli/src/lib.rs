pub mod commands;

use pipewatch_config::{default_pipeline, REVIEW_STAGE};

/// Worker order for a submission.
///
/// An explicit list wins. Otherwise the default pipeline is used, without its
/// review stage when `skip_review` is set.
pub fn resolve_pipeline(explicit: Option<Vec<String>>, skip_review: bool) -> Vec<String> {
    let pipeline = match explicit {
        Some(list) => list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => default_pipeline(),
    };
    if skip_review {
        return pipeline.into_iter().filter(|s| s != REVIEW_STAGE).collect();
    }
    pipeline
}
