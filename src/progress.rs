/// Advisory progress reporting for long-running pipeline stages. Sinks must
/// tolerate any status text; percent is 0–100.
pub trait ProgressSink {
    fn update(&self, status: &str, percent: f64);
}

/// Discards all updates.
#[allow(dead_code)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn update(&self, _status: &str, _percent: f64) {}
}

/// Prints one line per milestone.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn update(&self, status: &str, percent: f64) {
        println!("[{percent:>3.0}%] {status}");
    }
}
