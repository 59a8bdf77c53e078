use ahash::AHashMap;
use reorder_utils::{Error, ReorderResult};

/// Maps feature name -> weight (§4.6, §6 "weight list"). The name `"lm"`
/// is reserved and always resolves to `1.0`; it can never be overridden.
#[derive(Debug, Clone, Default)]
pub struct Weights {
    table: AHashMap<String, f32>,
}

impl Weights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the CLI weight-string format: comma-separated `name=float`
    /// pairs (§6).
    pub fn parse(s: &str) -> ReorderResult<Self> {
        let mut weights = Weights::new();
        for entry in s.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| Error::config(format!("malformed weight entry: \"{entry}\"")))?;
            let value: f32 = value
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("malformed weight value in: \"{entry}\"")))?;
            weights.add(name.trim(), value)?;
        }
        Ok(weights)
    }

    pub fn add(&mut self, name: &str, weight: f32) -> ReorderResult<()> {
        if name == "lm" {
            return Err(Error::config(
                "the \"lm\" weight is fixed at 1 and cannot be set",
            ));
        }
        if self.table.insert(name.to_string(), weight).is_some() {
            return Err(Error::config(format!(
                "feature \"{name}\" already has a weight"
            )));
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        name == "lm" || self.table.contains_key(name)
    }

    /// Looks up the weight for `name`. Panics if `name` is not `"lm"` and
    /// was never added: by the time `extend` runs, `Config::validate` has
    /// already checked every configured feature name has a weight, so this
    /// can only fail on a programming error (§9's two-tier error scheme:
    /// the typed `Error::config` lives at startup; this is the debug-only
    /// invariant for the hot loop).
    pub fn get(&self, name: &str) -> f32 {
        if name == "lm" {
            return 1.0;
        }
        *self
            .table
            .get(name)
            .unwrap_or_else(|| panic!("weight not found for feature: {name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_pairs() {
        let w = Weights::parse("rule_count=0.5,word_count=-1.2").unwrap();
        assert_eq!(w.get("rule_count"), 0.5);
        assert_eq!(w.get("word_count"), -1.2);
        assert_eq!(w.get("lm"), 1.0);
    }

    #[test]
    fn rejects_overriding_lm() {
        assert!(Weights::parse("lm=2.0").is_err());
    }

    #[test]
    fn rejects_duplicate_name() {
        assert!(Weights::parse("rule_count=1,rule_count=2").is_err());
    }

    #[test]
    fn rejects_malformed_entry() {
        assert!(Weights::parse("rule_count").is_err());
        assert!(Weights::parse("rule_count=notafloat").is_err());
    }
}
