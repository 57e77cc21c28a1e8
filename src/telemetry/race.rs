//! Per-race span helpers.

use tracing::Span;

use crate::model::Notice;

/// Span covering one poll of one race.
pub fn race_span(race_key: &str, title: &str) -> Span {
    tracing::info_span!("race.poll", "race.key" = race_key, "race.title" = title)
}

/// Log a notice inside the given span.
pub fn record_notice(span: &Span, notice: &Notice, delivered: bool) {
    span.in_scope(|| {
        tracing::info!(notice = %notice.message(), delivered, "notify");
    });
}
