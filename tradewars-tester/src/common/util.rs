#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(test)]
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Unique scratch path under the system temp dir for report output.
#[cfg(test)]
pub fn temp_report_path(label: &str, extension: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "tradewars-{label}-{}-{n}.{extension}",
        std::process::id()
    ))
}
