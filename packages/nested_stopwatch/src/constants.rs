// A poisoned lock means some thread panicked halfway through updating a span. The timestamps
// of that span can no longer be trusted to uphold the enclosure rules, so we panic as well.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - timing data may be \
    partially updated and the span tree can no longer be trusted";
