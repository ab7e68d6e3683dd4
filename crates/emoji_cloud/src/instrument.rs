use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Timing callback injected through the render options.
#[derive(Clone)]
pub struct Instrument {
    hook: Arc<dyn Fn(&str, Duration) + Send + Sync>,
}

impl Instrument {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        Self { hook: Arc::new(hook) }
    }

    pub fn record(&self, operation: &str, duration: Duration) {
        (self.hook)(operation, duration);
    }
}

impl fmt::Debug for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Instrument")
    }
}

/// Runs `f` and reports its duration to `instrument`, if any.
pub(crate) fn timed<T>(
    instrument: Option<&Instrument>,
    operation: &str,
    f: impl FnOnce() -> T,
) -> T {
    let Some(instrument) = instrument else {
        return f();
    };

    let started = Instant::now();
    let value = f();
    instrument.record(operation, started.elapsed());
    value
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn timed_reports_operation_name() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let instrument = Instrument::new(move |name, _| sink.lock().unwrap().push(name.to_owned()));

        let value = timed(Some(&instrument), "resize", || 7);

        assert_eq!(value, 7);
        assert_eq!(*seen.lock().unwrap(), vec!["resize".to_owned()]);
    }

    #[test]
    fn timed_without_instrument_just_runs() {
        assert_eq!(timed(None, "resize", || "done"), "done");
    }
}
