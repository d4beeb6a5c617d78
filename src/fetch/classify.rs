use regex::Regex;
use std::sync::LazyLock;

use crate::error::FetchErrorKind;

/// Status codes only count when labelled as such, so digits inside resource
/// names (`acme-500`) are ignored.
static HTTP_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:httperror|http error|code[=:]|status(?: code)?[=:]?)\s*(401|403|404|429|500|502|503|504)\b")
        .expect("Invalid regex pattern")
});

/// The shell's own report of a missing program, e.g. `sh: 1: gcloud: not found`
static SHELL_NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:sh|bash|dash|zsh)(?:: line \d+|: \d+)?: [^:\n]+: (?:command )?not found\s*$")
        .expect("Invalid regex pattern")
});

/// Exit code `sh` uses when the program could not be found
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Classifies a failed describe command from its stderr text.
///
/// Recognizes gRPC status names, HTTP status codes and the phrasing used by
/// gcloud. Anything unrecognized is `CommandFailed`, which is not retried.
pub fn classify_failure(stderr: &str) -> FetchErrorKind {
    let text = stderr.to_lowercase();
    if SHELL_NOT_FOUND.is_match(&text) {
        return FetchErrorKind::CommandFailed;
    }

    let status = HTTP_STATUS
        .captures(&text)
        .map(|caps| caps[1].to_string());

    // Auth first: a 403 on a missing resource is still an auth problem
    if matches!(status.as_deref(), Some("401" | "403"))
        || text.contains("permission_denied")
        || text.contains("unauthenticated")
        || text.contains("permission denied")
        || text.contains("does not have permission")
        || text.contains("reauthentication")
        || text.contains("active account")
        || text.contains("default credentials")
    {
        return FetchErrorKind::AuthFailure;
    }

    if text.contains("invalid_argument")
        || text.contains("invalid choice")
        || text.contains("unrecognized arguments")
        || text.contains("invalid value for")
    {
        return FetchErrorKind::MalformedIdentity;
    }

    if text.contains("not_found") || text.contains("not found") || text.contains("does not exist")
    {
        return FetchErrorKind::NotFound;
    }

    if text.contains("resource_exhausted")
        || text.contains("quota exceeded")
        || text.contains("rate limit")
        || text.contains("too many requests")
    {
        return FetchErrorKind::RateLimited;
    }

    if text.contains("unavailable")
        || text.contains("deadline_exceeded")
        || text.contains("deadline exceeded")
        || text.contains("connection reset")
        || text.contains("try again")
    {
        return FetchErrorKind::Unavailable;
    }

    match status.as_deref() {
        Some("404") => FetchErrorKind::NotFound,
        Some("429") => FetchErrorKind::RateLimited,
        Some(_) => FetchErrorKind::Unavailable,
        None => FetchErrorKind::CommandFailed,
    }
}
