//! Static deny tables for the safety classifier.
//!
//! These lists only catch the obviously catastrophic cases; the classifier is
//! advisory and must not be treated as a security boundary.

use lazy_static::lazy_static;
use regex::Regex;

/// Destructive fragments checked as plain lowercase substrings.
pub(crate) const DENY_SUBSTRINGS: &[&str] = &[
    "rm -rf",
    "del /f",
    "format",
    "fdisk",
    "dd if=",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    "init 0",
    "killall",
    "pkill -9",
    ":(){:|:&};:",
    "fork bomb",
    "sudo rm",
    "sudo dd",
    "sudo chmod 777 /",
    "curl | sh",
    "wget | sh",
];

lazy_static! {
    /// Path-specific destructive operations: wiping root, raw devices,
    /// remote pipe-to-shell.
    pub(crate) static ref DENY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"rm\s+-[a-z]*rf?[a-z]*\s+/(\s|$)").expect("valid deny pattern"),
        Regex::new(r"del\s+/f\s+/s\s+/q\s+c:").expect("valid deny pattern"),
        Regex::new(r">\s*/dev/sd[a-z]").expect("valid deny pattern"),
        Regex::new(r"chmod\s+777\s+/(\s|$)").expect("valid deny pattern"),
        Regex::new(r"chown\s+-r\s+root\s+/").expect("valid deny pattern"),
        Regex::new(r"dd\s+if=/dev/zero").expect("valid deny pattern"),
        Regex::new(r"mkfs\.\w+\s+/dev/").expect("valid deny pattern"),
        Regex::new(r"(curl|wget)[^|]*\|\s*(ba|z)?sh").expect("valid deny pattern"),
    ];
}

/// Shell metacharacters that trigger advisor escalation.
pub(crate) const METACHARACTERS: &[char] =
    &['|', '&', ';', '`', '$', '(', ')', '{', '}', '[', ']'];
