//! The demonstration routine run by the `horizon-sandbox` binary.

use std::sync::Arc;

use horizon_sandbox_core::{EventLoop, SharedObjectRegistry, SharedSink, Result};

use super::animal::{Animal, Canine};
use super::appliance::{Appliance, Freezable, Microwavable, Toastable};
use super::message::MessageBoard;
use super::radio::{Radio, Station};
use super::statics::StaticFunctions;
use crate::settings::DemoSettings;

/// Run every demonstration in order, logging through `sink`.
///
/// Returns the number of message board timer ticks observed. A failed
/// dog-years conversion is returned as [`SandboxError::Fatal`].
///
/// [`SandboxError::Fatal`]: horizon_sandbox_core::SandboxError::Fatal
#[tracing::instrument(skip_all, target = "horizon_sandbox::demo")]
pub fn run(
    settings: &DemoSettings,
    registry: &Arc<SharedObjectRegistry>,
    sink: SharedSink,
) -> Result<usize> {
    // Instance counting.
    let cat = Animal::new("cat", registry, Arc::clone(&sink));
    let bird = Animal::new("bird", registry, Arc::clone(&sink));
    cat.speak("meow");
    bird.speak("tweet");
    sink.info(&format!("Live objects: {}", registry.live_count()));
    drop(bird);
    sink.info(&format!("Live objects: {}", registry.live_count()));

    // Composition and fail-fast conversion.
    let dog = Canine::new("rex", registry, Arc::clone(&sink));
    dog.bark();
    let years = super::animal::convert_age(settings.dog_age, settings.dog_years_factor)?;
    sink.info(&format!("Dog years: {years}"));
    drop(dog);
    drop(cat);

    // Capabilities.
    let appliance = Appliance::new(Arc::clone(&sink));
    appliance.freeze();
    appliance.grill();
    appliance.cook();

    // Signals.
    let station = Station::new(settings.radio_channel, settings.station_name.clone());
    let radio = Radio::new(Arc::clone(&sink));
    {
        let _tuned = radio.tune(&station);
        station.send("Hello");
    }

    // Associated functions.
    StaticFunctions::new(registry, Arc::clone(&sink)).do_stuff();

    // Observable property and timer.
    let event_loop = EventLoop::new();
    let board =
        MessageBoard::new(&event_loop.handle(), settings.timer_interval(), Arc::clone(&sink))?;
    let listener_sink = Arc::clone(&sink);
    board.message_changed(move |message| {
        listener_sink.info(&format!("Message changed: {message}"))
    });
    board.set_message(settings.message.clone());

    event_loop.run_for(settings.run_duration())?;
    board.stop();

    let ticks = board.ticks();
    tracing::info!(target: "horizon_sandbox::demo", ticks, "demo finished");
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_sandbox_core::{MemorySink, SandboxError};

    fn quick_settings() -> DemoSettings {
        DemoSettings {
            timer_interval_ms: 20,
            run_duration_ms: 110,
            ..DemoSettings::default()
        }
    }

    #[test]
    fn test_run_logs_every_step() {
        let registry = Arc::new(SharedObjectRegistry::new());
        let sink = MemorySink::new();

        let ticks = run(&quick_settings(), &registry, sink.shared()).unwrap();

        assert!((3..=6).contains(&ticks), "unexpected tick count {ticks}");
        assert_eq!(sink.count("Test!"), ticks);
        assert_eq!(sink.count("Live objects: 2"), 1);
        assert_eq!(sink.count("Live objects: 1"), 1);
        assert!(sink.contains("BARK!"));
        assert_eq!(sink.count("Dog years: 322"), 1);
        assert_eq!(sink.count("Channel: 98, Name: Rock FM - Hello"), 1);
        assert_eq!(sink.count("doOtherStuff"), 1);
        assert_eq!(sink.count("Message changed: Hello from the property demo"), 1);
        // Every counted object was dropped.
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_run_fails_fast_on_bad_age() {
        let registry = Arc::new(SharedObjectRegistry::new());
        let sink = MemorySink::new();
        let settings = DemoSettings {
            dog_age: 0,
            ..quick_settings()
        };

        let err = run(&settings, &registry, sink.shared()).unwrap_err();
        match err {
            SandboxError::Fatal(fatal) => {
                assert_eq!(fatal.reason(), "age must be greater than zero")
            }
            other => panic!("expected fatal error, got {other}"),
        }
        // The routine stopped before the timer demo.
        assert_eq!(sink.count("Test!"), 0);
        assert_eq!(registry.live_count(), 0);
    }
}
