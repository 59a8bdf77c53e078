use std::path::Path;

use reorder_lm::InMemoryLm;
use reorder_utils::{Error, ReorderResult};

/// Loads an [`InMemoryLm`] from this workspace's own flat n-gram table
/// format: a first line giving the model order, then one line per n-gram
/// of `log10_prob<TAB>ids`, ids given oldest-to-newest and space-separated
/// (the same order `InMemoryLm::set` expects). This is a reference loader
/// for the in-memory LM, not a KenLM/ARPA parser: parsing a real back-off
/// LM file format is intentionally out of scope.
pub fn load_lm(path: &Path) -> ReorderResult<InMemoryLm> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate();

    let (_, order_line) = lines
        .next()
        .ok_or_else(|| Error::malformed_input("LM file is empty, expected an order line first"))?;
    let order: usize = order_line.trim().parse()?;
    let mut lm = InMemoryLm::new(order);

    for (lineno, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (prob_field, ids_field) = line.split_once('\t').ok_or_else(|| {
            Error::malformed_input(format!(
                "LM line {}: expected \"log10_prob\\tid id id...\"",
                lineno + 1
            ))
        })?;
        let log10_prob: f32 = prob_field.trim().parse()?;
        let ids: Vec<i32> = ids_field
            .split_whitespace()
            .map(|s| s.parse::<i32>())
            .collect::<Result<_, _>>()?;
        if ids.is_empty() {
            return Err(Error::malformed_input(format!(
                "LM line {}: empty n-gram",
                lineno + 1
            )));
        }
        if ids.len() > order {
            return Err(Error::malformed_input(format!(
                "LM line {}: n-gram of length {} exceeds model order {order}",
                lineno + 1,
                ids.len()
            )));
        }
        lm.set(&ids, log10_prob);
    }
    Ok(lm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reorder_lm::{History, LanguageModel};

    #[test]
    fn loads_order_and_entries() {
        let dir = std::env::temp_dir().join(format!("reorder-lm-loader-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lm.txt");
        std::fs::write(&path, "3\n-0.1\t5\n-0.2\t5 6\n").unwrap();

        let lm = load_lm(&path).unwrap();
        assert_eq!(lm.order(), 3);
        let ctx = lm.null_context();
        let (p, next) = lm.score(&ctx, 5);
        assert_eq!(p, -0.1);
        let (p2, _) = lm.score(&next, 6);
        assert_eq!(p2, -0.2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_ngram_longer_than_order() {
        let dir = std::env::temp_dir().join(format!("reorder-lm-loader-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lm.txt");
        std::fs::write(&path, "1\n-0.1\t5 6\n").unwrap();
        assert!(load_lm(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
