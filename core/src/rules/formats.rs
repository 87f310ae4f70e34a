use regex::Regex;

/// Per-key format patterns, compiled once per validation run.
pub struct FormatRules {
    pub http_url: Regex,
    pub https_url: Regex,
    pub http_only_url: Regex,
    pub sublime_text: Regex,
    pub platform: Regex,
    pub date: Regex,
    pub sha256: Regex,
    pub load_order: Regex,
    pub invalid_name_chars: Regex,
    pub release_base: Regex,
    pub shard_include: Regex,
    pub indentation: Regex,
    pub channel_repository: Regex,
    details_bitbucket: Regex,
    details_github: Regex,
    details_gitlab: Regex,
}

impl FormatRules {
    pub fn new() -> Self {
        let compile = |pattern: &str| {
            Regex::new(pattern).expect("static format pattern must compile")
        };
        FormatRules {
            http_url: compile(r"^https?://"),
            https_url: compile(r"^https://"),
            http_only_url: compile(r"^http://"),
            sublime_text: compile(r"^(\*|<=?\d{4}|>=?\d{4}|\d{4} - \d{4})$"),
            platform: compile(r"^(\*|(osx|linux|windows)(-(x(32|64)|arm64))?)$"),
            date: compile(r"^\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d$"),
            sha256: compile(r"^[0-9a-fA-F]{64}$"),
            load_order: compile(r"^\d\d$"),
            invalid_name_chars: compile(r#"[/?<>\\:*|"\x00-\x19]"#),
            release_base: compile(
                r"^(https://bitbucket\.org/[^/#?]+/[^/#?]+|https://github\.com/[^/#?]+/[^/#?]+|https://gitlab\.com/[^/#?]+/[^/#?]+)$",
            ),
            shard_include: compile(r"(?:^|/)(0-9|[a-z]|dependencies)\.json$"),
            indentation: compile(r"^\t*\S"),
            channel_repository: compile(r"^(\.|https://)"),
            details_bitbucket: compile(
                r"^https://bitbucket\.org/[^/#?]+/(?P<repo>[^/#?]+)(/src/[^#?]*[^/#?]|\#tags|/)?$",
            ),
            details_github: compile(
                r"^https://github\.com/[^/#?]+/(?P<repo>[^/#?]+)(/tree/[^#?]*[^/#?]|/)?$",
            ),
            details_gitlab: compile(
                r"^https://gitlab\.com/[^/#?]+/(?P<repo>[^/#?]+)(/-/tree/[^#?]*[^/#?]|/)?$",
            ),
        }
    }

    /// Canonical `details` URL: a bitbucket, github or gitlab repository
    /// root, optionally with a branch/tag path (`/src/`, `/tree/`,
    /// `/-/tree/`), a `#tags` fragment (bitbucket) or a trailing slash.
    /// Bare `.git` clone URLs are not accepted for github and gitlab.
    pub fn details_url_ok(&self, url: &str) -> bool {
        if self.details_bitbucket.is_match(url) {
            return true;
        }
        for pattern in [&self.details_github, &self.details_gitlab] {
            if let Some(captures) = pattern.captures(url) {
                if !captures["repo"].ends_with(".git") {
                    return true;
                }
            }
        }
        false
    }
}

impl Default for FormatRules {
    fn default() -> Self {
        FormatRules::new()
    }
}
