/// Spawns a task on a pool or scheduler, with optional tracing instrumentation.
///
/// `$pool` is anything with a `spawn(future)` method: a [`TaskPool`](crate::TaskPool)
/// or a scheduler wrapping one. The macro returns whatever that method returns.
///
/// When the calling crate enables its `instrument` feature, the task is wrapped
/// in a detached `trace_span` that follows from the current span, so the
/// task's events can be correlated with the call site that started the run.
///
/// # Syntax
///
/// ```text
/// // Simple case (no fields):
/// countdown_async::spawn!(pool, "task_name", async { ... })
///
/// // With span fields (use parentheses):
/// countdown_async::spawn!(pool, "task_name", (run = id, ?kind), async { ... })
/// ```
#[macro_export]
macro_rules! spawn {
    // Simple case: just task name and future (no fields)
    ($pool:expr, $name:literal, async $($rest:tt)*) => {{
        #[cfg(feature = "instrument")]
        {
            let task = async $($rest)*;
            let span = tracing::trace_span!(parent: None, $name);
            span.follows_from(tracing::Span::current());
            $pool.spawn(tracing::Instrument::instrument(task, span))
        }
        #[cfg(not(feature = "instrument"))]
        {
            $pool.spawn(async $($rest)*)
        }
    }};

    // Fields are wrapped in parentheses for clear delimitation
    ($pool:expr, $name:literal, ($($field:tt)*), async $($rest:tt)*) => {{
        #[cfg(feature = "instrument")]
        {
            let task = async $($rest)*;
            let span = tracing::trace_span!(parent: None, $name, $($field)*);
            span.follows_from(tracing::Span::current());
            $pool.spawn(tracing::Instrument::instrument(task, span))
        }
        #[cfg(not(feature = "instrument"))]
        {
            $pool.spawn(async $($rest)*)
        }
    }};
}
