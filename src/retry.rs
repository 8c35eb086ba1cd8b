use std::time::Duration;

use anyhow::Result;
use log::warn;

/// Runs `op` up to `attempts` times with a fixed delay between tries,
/// returning the first success. After the last failed attempt the final
/// error is returned; callers are expected to treat that as terminal.
pub fn with_retry<T>(
    what: &str,
    attempts: usize,
    delay: Duration,
    mut op: impl FnMut(usize) -> Result<T>,
) -> Result<T> {
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op(attempt) {
            Ok(val) => return Ok(val),
            Err(err) => {
                warn!("{what}: attempt {attempt}/{attempts} failed: {err:#}");
                last_err = Some(err);
                if attempt < attempts {
                    std::thread::sleep(delay);
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{what}: no attempts made")))
}

#[cfg(test)]
mod tests {
    use super::with_retry;
    use anyhow::anyhow;
    use std::time::Duration;

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0usize;
        let out = with_retry("test op", 10, Duration::ZERO, |attempt| {
            calls += 1;
            if attempt <= 3 {
                Err(anyhow!("transient"))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(out.unwrap(), 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn fails_fast_after_exhausting_attempts() {
        let mut calls = 0usize;
        let out: anyhow::Result<()> = with_retry("test op", 10, Duration::ZERO, |_| {
            calls += 1;
            Err(anyhow!("down"))
        });
        assert!(out.is_err());
        assert_eq!(calls, 10);
    }
}
