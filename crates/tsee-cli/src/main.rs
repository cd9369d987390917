use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tsee_core::typed::NewListener;
use tsee_core::{ChannelName, EmitterOptions, Listener, TypedEmitter, channels};

channels! {
    /// Events of one build job.
    BuildEvents {
        Started("started") => (String,),
        Progress("progress") => (String, u32),
        Finished("finished") => (String, bool),
        Error("error") => (String,),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    emitter: EmitterOptions,
    steps: Option<u32>,
}

fn load_config() -> Result<DemoConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(DemoConfig::default()),
    }
}

/// Completion percentage of `step` out of `steps`, clamped to 100.
fn percent(step: u32, steps: u32) -> u32 {
    if steps == 0 {
        return 100;
    }
    let pct = u64::from(step) * 100 / u64::from(steps);
    pct.min(100) as u32
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = load_config()?;
    let steps = config.steps.unwrap_or(4);
    let events = TypedEmitter::<BuildEvents>::with_options(config.emitter);

    // (A) registration log via the meta channel
    events.on(
        NewListener,
        &Listener::new(|(channel,): &(ChannelName,)| {
            tracing::info!(%channel, "listener registered");
            Ok(())
        }),
    );

    // (B) build listeners
    events
        .once(
            Started,
            &Listener::new(|(job,): &(String,)| {
                println!("build {job} started");
                Ok(())
            }),
        )
        .on(
            Progress,
            &Listener::new(|(job, pct): &(String, u32)| {
                println!("build {job}: {pct}%");
                Ok(())
            }),
        )
        .on(
            Error,
            &Listener::new(|(reason,): &(String,)| {
                tracing::warn!(%reason, "build reported an error");
                Ok(())
            }),
        );

    let failures = Arc::new(AtomicU32::new(0));
    let counter = failures.clone();
    events.prepend_listener(
        Finished,
        &Listener::new(move |(_, ok): &(String, bool)| {
            if !ok {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        }),
    );

    // (C) an async observer awaiting the result
    let finished = events.wait_for(Finished);
    let mut progress = events.subscribe(Progress);

    // (D) drive the job
    let job = "demo".to_string();
    events.emit(Started, (job.clone(),))?;
    for step in 1..=steps {
        sleep(Duration::from_millis(20)).await;
        events.emit(Progress, (job.clone(), percent(step, steps)))?;
    }
    events.emit(Error, ("flaky test retried".to_string(),))?;
    events.emit(Finished, (job.clone(), true))?;

    let (name, ok) = finished.await?;
    let mut seen = 0;
    while progress.try_recv().is_some() {
        seen += 1;
    }
    println!(
        "final: job={name} ok={ok} progress_events={seen} failures={}",
        failures.load(Ordering::Relaxed)
    );

    // Started was a once-listener: a second start goes unheard.
    let heard = events.emit(Started, (job,))?;
    println!("second start handled: {heard}");
    Ok(())
}
