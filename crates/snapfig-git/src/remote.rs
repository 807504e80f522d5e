//! Remote URL helpers for token authentication

use std::sync::LazyLock;

use regex::Regex;

/// User name presented alongside an access token over HTTPS.
pub const TOKEN_USER: &str = "x-access-token";

static SSH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^git@([^:]+):(.+)$").expect("SSH URL pattern is valid")
});

/// Rewrite an SSH-style remote (`git@host:path`) to its HTTPS form.
///
/// Token authentication only works over HTTPS; other URLs are returned
/// unchanged.
pub fn https_remote_url(url: &str) -> String {
    match SSH_URL.captures(url) {
        Some(caps) => format!("https://{}/{}", &caps[1], &caps[2]),
        None => url.to_string(),
    }
}

/// The URL to talk to when `token` may be set.
pub fn effective_remote_url(url: &str, token: Option<&str>) -> String {
    match token {
        Some(t) if !t.is_empty() => https_remote_url(url),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("git@github.com:user/dotfiles.git", "https://github.com/user/dotfiles.git")]
    #[case("git@gitlab.example.org:team/vault", "https://gitlab.example.org/team/vault")]
    #[case("https://github.com/user/dotfiles.git", "https://github.com/user/dotfiles.git")]
    #[case("/srv/git/vault.git", "/srv/git/vault.git")]
    fn rewrites_only_ssh_urls(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(https_remote_url(input), expected);
    }

    #[test]
    fn effective_url_ignores_empty_token() {
        let url = "git@github.com:user/dotfiles.git";
        assert_eq!(effective_remote_url(url, Some("")), url);
        assert_eq!(effective_remote_url(url, None), url);
        assert_eq!(
            effective_remote_url(url, Some("ghp_123")),
            "https://github.com/user/dotfiles.git"
        );
    }
}
