// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Per instance environment derivation

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;

/// Token in a directive value that is replaced by the instance index
pub const INDEX_TOKEN: &str = "{i}";

/// Environment of a single instance, keyed by variable name
pub type EnvMap = BTreeMap<OsString, OsString>;

/// One `--env` entry, applied to the environment of every instance
///
/// `KEY=VALUE` sets `KEY`, with each [`INDEX_TOKEN`] in `VALUE` replaced by the
/// decimal instance index. A bare `KEY` removes it. Parsing never fails, an
/// empty key is carried through literally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Set { key: String, value: String },
    Remove { key: String },
}

impl Directive {
    pub fn parse(directive: &str) -> Self {
        match directive.split_once('=') {
            Some((key, value)) => Self::Set {
                key: key.to_string(),
                value: value.to_string(),
            },
            None => Self::Remove {
                key: directive.to_string(),
            },
        }
    }

    /// Apply this directive to `env` as seen by instance `index`
    pub fn apply(&self, env: &mut EnvMap, index: usize) {
        match self {
            Self::Set { key, value } => {
                env.insert(
                    OsString::from(key),
                    OsString::from(substitute_index(value, index)),
                );
            }
            Self::Remove { key } => {
                env.remove(&OsString::from(key));
            }
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { key, value } => write!(f, "{}={}", key, value),
            Self::Remove { key } => f.write_str(key),
        }
    }
}

/// Replace every [`INDEX_TOKEN`] in `value` with `index`, no padding
pub fn substitute_index(value: &str, index: usize) -> String {
    value.replace(INDEX_TOKEN, &index.to_string())
}

/// The environment of the current process
pub fn ambient_env() -> EnvMap {
    std::env::vars_os().collect()
}

/// Derive the environment for instance `index`.
///
/// Directives are applied in order to a copy of `ambient`, so a later directive
/// overrides an earlier one for the same key.
pub fn derive_env(ambient: &EnvMap, index: usize, directives: &[Directive]) -> EnvMap {
    let mut env = ambient.clone();
    for directive in directives {
        directive.apply(&mut env, index);
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ambient(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }

    fn directives(raw: &[&str]) -> Vec<Directive> {
        raw.iter().map(|d| Directive::parse(d)).collect()
    }

    fn get<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
        env.get(&OsString::from(key)).and_then(|v| v.to_str())
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        assert_eq!(
            Directive::parse("URL=http://host/?a=b"),
            Directive::Set {
                key: "URL".to_string(),
                value: "http://host/?a=b".to_string()
            }
        );
        assert_eq!(
            Directive::parse("EMPTY="),
            Directive::Set {
                key: "EMPTY".to_string(),
                value: String::new()
            }
        );
        assert_eq!(
            Directive::parse("GONE"),
            Directive::Remove {
                key: "GONE".to_string()
            }
        );
    }

    #[test]
    fn test_display_matches_input() {
        for raw in &["A=1", "B={i}", "C", "=x", ""] {
            assert_eq!(Directive::parse(raw).to_string(), *raw);
        }
    }

    #[test]
    fn test_index_substitution() {
        let env = derive_env(&EnvMap::new(), 3, &directives(&["FOO={i}"]));
        assert_eq!(get(&env, "FOO"), Some("3"));

        let other = derive_env(&EnvMap::new(), 0, &directives(&["FOO={i}"]));
        assert_eq!(get(&other, "FOO"), Some("0"));
    }

    #[test]
    fn test_substitution_replaces_every_token_without_padding() {
        assert_eq!(substitute_index("{i}-{i}", 7), "7-7");
        assert_eq!(substitute_index("port{i}0", 12), "port120");
        assert_eq!(substitute_index("{i:03}", 1), "{i:03}");
        assert_eq!(substitute_index("plain", 1), "plain");
    }

    #[test]
    fn test_remove_present_key() {
        let base = ambient(&[("BAR", "x"), ("KEEP", "y")]);
        let env = derive_env(&base, 0, &directives(&["BAR"]));

        assert_eq!(get(&env, "BAR"), None);
        assert_eq!(get(&env, "KEEP"), Some("y"));
        // the ambient map is untouched
        assert_eq!(get(&base, "BAR"), Some("x"));
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let base = ambient(&[("KEEP", "y")]);
        let env = derive_env(&base, 0, &directives(&["BAR"]));
        assert_eq!(env, base);
    }

    #[test]
    fn test_later_directives_win() {
        let env = derive_env(&EnvMap::new(), 0, &directives(&["X=1", "X=2"]));
        assert_eq!(get(&env, "X"), Some("2"));

        let env = derive_env(&EnvMap::new(), 0, &directives(&["X=1", "X"]));
        assert_eq!(get(&env, "X"), None);

        let env = derive_env(&EnvMap::new(), 0, &directives(&["X", "X=1"]));
        assert_eq!(get(&env, "X"), Some("1"));
    }

    #[test]
    fn test_overrides_ambient_value() {
        let base = ambient(&[("HOME", "/root")]);
        let env = derive_env(&base, 5, &directives(&["HOME=/home/{i}"]));
        assert_eq!(get(&env, "HOME"), Some("/home/5"));
    }

    #[test]
    fn test_empty_key_is_applied_literally() {
        let env = derive_env(&EnvMap::new(), 2, &directives(&["=v{i}"]));
        assert_eq!(get(&env, ""), Some("v2"));

        let env = derive_env(&env, 2, &directives(&[""]));
        assert!(env.is_empty());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let base = ambient(&[("A", "1"), ("B", "2")]);
        let dirs = directives(&["A", "C={i}", "B=b{i}"]);

        let first = derive_env(&base, 9, &dirs);
        let second = derive_env(&base, 9, &dirs);
        assert_eq!(first, second);
    }
}
