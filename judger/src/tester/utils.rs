use difference::{Changeset, Difference};
use std::{ffi::CStr, time::Duration};

use crate::runner::ExitStatus;

/// Whitespace-only normalization applied to both produced and expected output.
pub fn normalize_output(s: &str) -> &str {
    s.trim()
}

/// Convert a time limit in seconds. `None` unless `secs` is finite and
/// positive; limits too large for a [`Duration`] saturate at [`Duration::MAX`].
pub fn duration_from_secs(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

/// Generate a diff String of two Strings.
pub fn diff<'a>(got: &'a str, expected: &'a str) -> (bool, String) {
    let changeset = Changeset::new(got, expected, "\n");
    let mut change_string = String::new();
    let mut different = false;

    let mut add_diff_ln = |ic: char, s: &str| {
        for l in s.lines() {
            change_string.push(ic);
            change_string.push(' ');
            change_string.push_str(l);
            change_string.push('\n');
        }
    };

    for diff in changeset.diffs {
        match diff {
            Difference::Same(s) => add_diff_ln(' ', &s),
            Difference::Add(s) => {
                add_diff_ln('+', &s);
                different = true;
            }
            Difference::Rem(s) => {
                add_diff_ln('-', &s);
                different = true
            }
        }
    }

    (different, change_string)
}

/// Describe a signal code (>=0).
#[cfg(unix)]
pub fn strsignal(signal: u32) -> String {
    // SAFETY: `strsignal` returns either null or a pointer to a static
    // NUL-terminated string, which is copied out immediately.
    let c_buf = unsafe { libc::strsignal(signal as libc::c_int) };
    if c_buf.is_null() {
        return format!("signal {}", signal);
    }
    let c_str = unsafe { CStr::from_ptr(c_buf) };
    c_str.to_string_lossy().into_owned()
}

#[cfg(not(unix))]
pub fn strsignal(signal: u32) -> String {
    format!("signal {}", signal)
}

/// Human-readable description of an abnormal exit.
pub fn describe_exit(status: &ExitStatus) -> String {
    match status {
        ExitStatus::ReturnCode(code) => format!("exited with code {}", code),
        ExitStatus::Signal(sig) => format!("{} (signal {})", strsignal(*sig), sig),
        ExitStatus::Timeout => "timed out".into(),
        ExitStatus::Unknown => "unknown exit status".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff() {
        let s1 = "Hello,\nworld!\nHi!";
        let s2 = "Hello,\nthis cruel\nworld!";
        let d = diff(s1, s2);
        assert_eq!(
            dbg!(d),
            (
                true,
                "  \
                Hello,\n\
                + this cruel\n  \
                world!\n\
                - Hi!\n"
                    .into()
            )
        );
    }

    #[test]
    fn test_diff_same() {
        let s1 = "5\n";
        let d = diff(s1, s1);
        assert_eq!(d, (false, "  5\n".into()));
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("  5\n\n"), "5");
        assert_eq!(normalize_output("\t1 2\n3 4\r\n"), "1 2\n3 4");
        // Only leading and trailing whitespace is touched.
        assert_eq!(normalize_output("1  2"), "1  2");
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(duration_from_secs(1.5), Some(Duration::from_millis(1500)));
        assert_eq!(duration_from_secs(1e20), Some(Duration::MAX));
        assert_eq!(duration_from_secs(f64::MAX), Some(Duration::MAX));
        assert_eq!(duration_from_secs(0.0), None);
        assert_eq!(duration_from_secs(-2.0), None);
        assert_eq!(duration_from_secs(f64::NAN), None);
        assert_eq!(duration_from_secs(f64::INFINITY), None);
    }

    #[test]
    fn test_describe_exit() {
        assert_eq!(
            describe_exit(&ExitStatus::ReturnCode(2)),
            "exited with code 2"
        );
        assert!(describe_exit(&ExitStatus::Signal(11)).ends_with("(signal 11)"));
    }
}
