//! Property-based tests for URL canonicalization.
//!
//! These tests use proptest to generate remote URLs in their various
//! spellings and verify that canonicalization invariants hold.

#[cfg(test)]
mod proptest_tests {
    use crate::identity::RepositoryIdentity;
    use proptest::prelude::*;

    fn host() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,8}\\.(com|org|io)"
    }

    fn repo_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z][a-z0-9_-]{0,8}", 1..4).prop_map(|s| s.join("/"))
    }

    proptest! {
        /// Property: parsing is idempotent (canonical form re-parses to itself)
        #[test]
        fn parse_is_idempotent(host in host(), path in repo_path()) {
            let first = RepositoryIdentity::parse(&format!("https://{}/{}.git", host, path)).unwrap();
            let second = RepositoryIdentity::parse(first.as_str()).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: scp-like, ssh and https spellings agree
        #[test]
        fn spellings_agree(host in host(), path in repo_path()) {
            let https = RepositoryIdentity::parse(&format!("https://{}/{}", host, path)).unwrap();
            let scp = RepositoryIdentity::parse(&format!("git@{}:{}.git", host, path)).unwrap();
            let ssh = RepositoryIdentity::parse(&format!("ssh://git@{}/{}/", host, path)).unwrap();
            prop_assert_eq!(&https, &scp);
            prop_assert_eq!(&https, &ssh);
        }

        /// Property: canonical form never ends with a slash or `.git`
        #[test]
        fn canonical_has_no_suffix(host in host(), path in repo_path(), slash in any::<bool>()) {
            let raw = format!("https://{}/{}.git{}", host, path, if slash { "/" } else { "" });
            let id = RepositoryIdentity::parse(&raw).unwrap();
            prop_assert!(!id.as_str().ends_with('/'));
            prop_assert!(!id.as_str().ends_with(".git"));
            prop_assert!(id.as_str().starts_with("https://"));
        }

        /// Property: the name is the last path segment
        #[test]
        fn name_is_last_segment(host in host(), path in repo_path()) {
            let id = RepositoryIdentity::parse(&format!("https://{}/{}", host, path)).unwrap();
            let last = path.rsplit('/').next().unwrap();
            prop_assert_eq!(id.name(), last);
        }
    }
}
