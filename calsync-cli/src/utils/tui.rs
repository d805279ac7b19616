use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(80);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_strings(&["◐", "◓", "◑", "◒", "●"])
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Await `future` behind a spinner, cleared once it resolves.
///
/// Nothing is drawn when stderr is not a terminal.
pub async fn with_spinner<F: Future>(message: impl Into<String>, future: F) -> F::Output {
    spinner_on(ProgressDrawTarget::stderr(), message.into(), future).await
}

async fn spinner_on<F: Future>(target: ProgressDrawTarget, message: String, future: F) -> F::Output {
    let spinner = ProgressBar::with_draw_target(None, target);
    spinner.set_style(spinner_style());
    spinner.set_message(message);
    spinner.enable_steady_tick(TICK_INTERVAL);

    let output = future.await;
    spinner.finish_and_clear();
    output
}
