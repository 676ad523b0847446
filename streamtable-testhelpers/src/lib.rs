#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Shared test setup for the workspace.
//!
//! Annotate tests with [`test`] (or call [`setup`] yourself) to get trace
//! output from the crates under test. The filter is read from
//! `STREAMTABLE_LOG` using `tracing_subscriber`'s target syntax, e.g.
//! `STREAMTABLE_LOG=streamtable=debug,stache=off`; everything is logged at
//! TRACE when it is unset.

pub use streamtable_testhelpers_macros::test;

use std::sync::LazyLock;
use std::time::Instant;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "STREAMTABLE_LOG";

static STARTED: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Prints time since the first test in the process started.
struct SinceStart;

impl FormatTime for SinceStart {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let elapsed = STARTED.elapsed();
        write!(w, "+{}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
    }
}

fn filter() -> Targets {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|spec| spec.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::TRACE))
}

static SUBSCRIBER: LazyLock<()> = LazyLock::new(|| {
    LazyLock::force(&STARTED);

    // Another harness may have installed a subscriber already.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_timer(SinceStart)
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .with(filter())
        .try_init();
});

/// Install the test subscriber. Calling it more than once is harmless.
pub fn setup() {
    LazyLock::force(&SUBSCRIBER);
}

/// An error type that panics when it is built, so tests can use `?` on any
/// error and still get a panic with the caller's location.
#[derive(Debug)]
pub struct IPanic;

impl<E> From<E> for IPanic
where
    E: core::error::Error + Send + Sync,
{
    #[track_caller]
    fn from(value: E) -> Self {
        panic!("from: {}: {value}", core::panic::Location::caller())
    }
}
