use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Identity of a project within the portfolio
    ProjectId
);
string_id!(
    /// Identity of a stage within its project
    StageId
);
string_id!(
    /// Identity of an object within its project
    ObjectId
);

/// Mint a fresh identity string: `<unix-millis>-<8 hex>`.
///
/// `taken` is consulted so a minted id never collides with one already
/// present in the target collection.
pub fn mint_id(taken: impl Fn(&str) -> bool) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    loop {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let candidate = format!("{}-{}", millis, &suffix[..8]);
        if !taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn minted_ids_have_timestamp_and_suffix() {
        let id = mint_id(|_| false);
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn minted_ids_skip_taken_values() {
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let id = mint_id(|c| seen.contains(c));
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = StageId::new("s1-3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"s1-3\"");
        let back: StageId = serde_json::from_str("\"s1-3\"").unwrap();
        assert_eq!(back, "s1-3");
    }
}
