//! The `reorder` binary: CLI surface, configuration construction, and the
//! per-sentence driver loop, seen from the caller's side.
//!
//! The core crates (`reorder-ir`, `reorder-opt`, `reorder-backend`) know
//! nothing about files, flags, or threads; this binary is the only place
//! that does: file I/O, chopping, and constraints are all treated as
//! external collaborators the core merely consumes the output of.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use argh::FromArgs;
use itertools::Itertools;

use reorder_backend::{
    add_input, compact, mark_final, when_lost_input, FstOps, FstSink, SparseFst, TropicalFst,
};
use reorder_frontend::{
    build_chunk_map, chunk_bounds, load_candidates, load_chop_file, load_constraints_file, load_lm,
    load_punctuation_file, parse_chop_line, parse_constraints_line, Chopper, NullChopper,
    PunctuationChopper, SillyChopper, Vocab,
};
use reorder_ir::ChunkCandidates;
use reorder_lm::InMemoryLm;
use reorder_opt::{build_lattice, extend, instantiate_features, Config, Feature, FeatureRegistry, Task, Weights};
use reorder_utils::{Error, ReorderResult, SentenceRange};

/// Reorders each sentence in a tokenized input file into a weighted FST of
/// candidate reorderings, searching a lattice of n-gram candidates under a
/// back-off language model plus a linear combination of feature functions.
#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help"))]
struct Opts {
    /// path to the tokenized sentence file: one sentence per line,
    /// whitespace-separated integer word ids
    #[argh(option, long = "sentences")]
    sentence_file: PathBuf,

    /// directory holding one n-gram candidate file per sentence, named
    /// "<id>.cand" (1-based sentence id)
    #[argh(option, long = "candidates")]
    candidate_dir: PathBuf,

    /// path to the language model file (this workspace's own flat n-gram
    /// table format, see `reorder_frontend::load_lm`)
    #[argh(option, long = "lm")]
    lm_file: PathBuf,

    /// directory to write one serialized FST per sentence into, named
    /// "<id>.fst"
    #[argh(option, long = "output-dir", short = 'o')]
    output_dir: PathBuf,

    /// 1-based sentence ids to process, e.g. "1:10,15" (default: all
    /// sentences in the sentence file)
    #[argh(option, long = "range")]
    range: Option<String>,

    /// maximum coverage overlap allowed when applying a candidate rule
    #[argh(option, long = "max-overlap", default = "0")]
    max_overlap: usize,

    /// n-best pruning: keep at most this many states per column (0 disables)
    #[argh(option, long = "prune-nbest", default = "0")]
    prune_nbest: usize,

    /// beam pruning: drop states costing more than `min + threshold` (0.0 disables)
    #[argh(option, long = "prune-threshold", default = "0.0")]
    prune_threshold: f32,

    /// prune weight applied during output compaction, separate from
    /// search-time beam pruning (0.0 disables)
    #[argh(option, long = "dump-prune", default = "0.0")]
    dump_prune: f32,

    /// allow dropping a word while still consuming its coverage bit,
    /// encoded as an epsilon-labeled arc
    #[argh(switch, long = "allow-deletion")]
    allow_deletion: bool,

    /// append a path spelling the literal input, guaranteeing it is always
    /// a recognized path in the output FST
    #[argh(switch, long = "add-input")]
    add_input: bool,

    /// log the lattice column at which the input prefix stopped surviving,
    /// if any
    #[argh(switch, long = "when-lost-input")]
    when_lost_input: bool,

    /// comma-separated feature names to enable beyond the implicit "lm" term
    #[argh(option, long = "features", default = "String::new()")]
    features: String,

    /// comma-separated `name=value` weight pairs for the enabled features
    #[argh(option, long = "weights", default = "String::new()")]
    weights: String,

    /// "decode" (tropical scalar weights) or "tune" (sparse per-feature
    /// weight tuples for a downstream trainer)
    #[argh(option, long = "task", default = "String::from(\"decode\")")]
    task: String,

    /// chop strategy: "none", "silly", "punctuation", or "from-file"
    #[argh(option, long = "chop-strategy", default = "String::from(\"none\")")]
    chop_strategy: String,

    /// maximum chunk length for the "silly" and "punctuation" chop strategies
    #[argh(option, long = "max-chop", default = "usize::MAX")]
    max_chop: usize,

    /// punctuation symbol file, required by the "punctuation" chop strategy
    #[argh(option, long = "punctuation-file")]
    punctuation_file: Option<PathBuf>,

    /// tab-separated id-to-word file, required by the "punctuation" chop strategy
    #[argh(option, long = "word-map")]
    word_map: Option<PathBuf>,

    /// chop file, required by the "from-file" chop strategy
    #[argh(option, long = "chop-file")]
    chop_file: Option<PathBuf>,

    /// constraints strategy: "all-reorderable" or "from-file"
    #[argh(option, long = "constraints-strategy", default = "String::from(\"all-reorderable\")")]
    constraints_strategy: String,

    /// constraints file, required by the "from-file" constraints strategy
    #[argh(option, long = "constraints-file")]
    constraints_file: Option<PathBuf>,

    /// number of worker threads to fan sentences out across (default: available parallelism)
    #[argh(option, long = "threads")]
    threads: Option<usize>,
}

fn parse_sentence_file(path: &Path) -> ReorderResult<Vec<Vec<i32>>> {
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .map(|line| {
            line.split_whitespace()
                .map(|s| s.parse::<i32>())
                .collect::<Result<Vec<i32>, _>>()
                .map_err(Error::from)
        })
        .collect()
}

enum ChopStrategy {
    None,
    Silly { max_num_words: usize },
    Punctuation { max_num_words: usize, punctuation_ids: HashSet<i32> },
    FromFile { lines: Vec<String> },
}

enum ConstraintsStrategy {
    AllReorderable,
    FromFile { lines: Vec<String> },
}

fn chop_strategy(opts: &Opts) -> ReorderResult<ChopStrategy> {
    match opts.chop_strategy.as_str() {
        "none" => Ok(ChopStrategy::None),
        "silly" => Ok(ChopStrategy::Silly { max_num_words: opts.max_chop }),
        "punctuation" => {
            let word_map = opts
                .word_map
                .as_ref()
                .ok_or_else(|| Error::config("--chop-strategy punctuation requires --word-map"))?;
            let punctuation_file = opts.punctuation_file.as_ref().ok_or_else(|| {
                Error::config("--chop-strategy punctuation requires --punctuation-file")
            })?;
            let vocab = Vocab::load(word_map)?;
            let punctuation = load_punctuation_file(punctuation_file)?;
            let punctuation_ids = resolve_punctuation_ids(&vocab, &punctuation);
            Ok(ChopStrategy::Punctuation { max_num_words: opts.max_chop, punctuation_ids })
        }
        "from-file" => {
            let chop_file = opts
                .chop_file
                .as_ref()
                .ok_or_else(|| Error::config("--chop-strategy from-file requires --chop-file"))?;
            Ok(ChopStrategy::FromFile { lines: load_chop_file(chop_file)? })
        }
        other => Err(Error::config(format!("unknown chop strategy: {other}"))),
    }
}

/// `Vocab` only maps id -> word; this resolves which ids spell a
/// punctuation symbol once up front so every sentence's chopper can do a
/// plain integer-set lookup: the core, and now the per-sentence hot path,
/// never inspects word spellings.
fn resolve_punctuation_ids(vocab: &Vocab, punctuation: &HashSet<String>) -> HashSet<i32> {
    vocab
        .entries()
        .filter(|(_, word)| punctuation.contains(*word))
        .map(|(id, _)| id)
        .collect()
}

fn constraints_strategy(opts: &Opts) -> ReorderResult<ConstraintsStrategy> {
    match opts.constraints_strategy.as_str() {
        "all-reorderable" => Ok(ConstraintsStrategy::AllReorderable),
        "from-file" => {
            let constraints_file = opts.constraints_file.as_ref().ok_or_else(|| {
                Error::config("--constraints-strategy from-file requires --constraints-file")
            })?;
            Ok(ConstraintsStrategy::FromFile { lines: load_constraints_file(constraints_file)? })
        }
        other => Err(Error::config(format!("unknown constraints strategy: {other}"))),
    }
}

fn compute_chop(strategy: &ChopStrategy, input: &[i32], sentence_id: usize) -> ReorderResult<Vec<usize>> {
    match strategy {
        ChopStrategy::None => Ok(NullChopper.chop(input)),
        ChopStrategy::Silly { max_num_words } => Ok(SillyChopper { max_num_words: *max_num_words }.chop(input)),
        ChopStrategy::Punctuation { max_num_words, punctuation_ids } => {
            let is_punct = |id: i32| punctuation_ids.contains(&id);
            Ok(PunctuationChopper { max_num_words: *max_num_words, is_punctuation: &is_punct }.chop(input))
        }
        ChopStrategy::FromFile { lines } => {
            let line = lines.get(sentence_id - 1).ok_or_else(|| {
                Error::malformed_input(format!("chop file has no line for sentence {sentence_id}"))
            })?;
            parse_chop_line(line, input.len())
        }
    }
}

fn compute_constraints(
    strategy: &ConstraintsStrategy,
    num_chunks: usize,
    sentence_id: usize,
) -> ReorderResult<Vec<bool>> {
    match strategy {
        ConstraintsStrategy::AllReorderable => Ok(vec![true; num_chunks]),
        ConstraintsStrategy::FromFile { lines } => {
            let line = lines.get(sentence_id - 1).ok_or_else(|| {
                Error::malformed_input(format!("constraints file has no line for sentence {sentence_id}"))
            })?;
            parse_constraints_line(line, num_chunks)
        }
    }
}

/// Drives one sentence through lattice construction, column extension
/// (chunk by chunk, left to right), and finalization, then writes the
/// resulting FST. Generic over the arc-weight semiring so the same driving
/// logic serves both `decode` and `tune`.
#[allow(clippy::too_many_arguments)]
fn process_sentence<S: FstSink + FstOps + Default>(
    sentence_id: usize,
    input: &[i32],
    lm: &InMemoryLm,
    features: &[(String, Box<dyn Feature>)],
    weights: &Weights,
    config: &Config,
    candidate_dir: &Path,
    output_dir: &Path,
    chop: &ChopStrategy,
    constraints: &ConstraintsStrategy,
) -> ReorderResult<()> {
    let n = input.len();
    let candidate_path = candidate_dir.join(format!("{sentence_id}.cand"));
    let raw = load_candidates(&candidate_path, n)?;
    let chop_bounds = compute_chop(chop, input, sentence_id)?;
    let reorderable = compute_constraints(constraints, chop_bounds.len(), sentence_id)?;
    let chunk_map: Vec<ChunkCandidates> = build_chunk_map(raw, input, &chop_bounds, &reorderable)?;
    let bounds = chunk_bounds(&chop_bounds);

    let mut sink = S::default();
    let mut lattice = build_lattice(input.to_vec(), lm, &mut sink);

    for (candidates, (start, end)) in chunk_map.iter().zip(bounds.iter()) {
        for c in *start..*end {
            extend(&mut lattice, c, candidates, lm, features, weights, &mut sink, config);
        }
    }

    mark_final(&lattice, &mut sink);
    if config.add_input {
        add_input(&lattice, lm, &mut sink);
    }
    if config.when_lost_input {
        match when_lost_input(&lattice) {
            Some(idx) => log::info!("sentence {sentence_id}: lost input prefix at column {idx}"),
            None => log::debug!("sentence {sentence_id}: input prefix survived to the final column"),
        }
    }
    compact(&mut sink, config.dump_prune)?;

    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(format!("{sentence_id}.fst"));
    sink.write(&output_path)?;
    Ok(())
}

fn run() -> ReorderResult<()> {
    let opts: Opts = argh::from_env();

    let sentences = parse_sentence_file(&opts.sentence_file)?;
    let range = match &opts.range {
        Some(spec) => SentenceRange::parse(spec)?,
        None => SentenceRange::all(sentences.len()),
    };

    let registry = FeatureRegistry::new();
    let feature_names: Vec<String> = opts
        .features
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let weights = Weights::parse(&opts.weights)?;
    let task = match opts.task.as_str() {
        "decode" => Task::Decode,
        "tune" => Task::Tune,
        other => return Err(Error::config(format!("unknown task: {other}"))),
    };

    let config = Config {
        max_overlap: opts.max_overlap,
        prune_nbest: opts.prune_nbest,
        prune_threshold: opts.prune_threshold,
        dump_prune: opts.dump_prune,
        allow_deletion: opts.allow_deletion,
        add_input: opts.add_input,
        when_lost_input: opts.when_lost_input,
        task,
        feature_names,
        weights,
    };
    config.validate(&registry)?;
    let features = instantiate_features(&config, &registry)?;
    log::info!(
        "task={:?} features=[{}]",
        config.task,
        features.iter().map(|(name, _)| name.as_str()).join(", ")
    );

    let lm = load_lm(&opts.lm_file)?;
    let chop = chop_strategy(&opts)?;
    let constraints = constraints_strategy(&opts)?;

    let threads = opts
        .threads
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1);

    let queue: Mutex<VecDeque<usize>> = Mutex::new(range.ids().filter(|&id| id <= sentences.len()).collect());
    let total = queue.lock().unwrap().len();
    let failures = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| loop {
                let Some(id) = queue.lock().unwrap().pop_front() else {
                    break;
                };
                let input = &sentences[id - 1];
                log::info!("sentence {id}: decoding {} words", input.len());
                let result = match config.task {
                    Task::Decode => process_sentence::<TropicalFst>(
                        id,
                        input,
                        &lm,
                        &features,
                        &config.weights,
                        &config,
                        &opts.candidate_dir,
                        &opts.output_dir,
                        &chop,
                        &constraints,
                    ),
                    Task::Tune => process_sentence::<SparseFst>(
                        id,
                        input,
                        &lm,
                        &features,
                        &config.weights,
                        &config,
                        &opts.candidate_dir,
                        &opts.output_dir,
                        &chop,
                        &constraints,
                    ),
                };
                if let Err(e) = result {
                    log::warn!("sentence {id}: failed: {e}");
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    let failed = failures.load(Ordering::Relaxed);
    if failed > 0 {
        log::warn!("{failed}/{total} sentences failed to decode");
    }
    if total > 0 && failed == total {
        return Err(Error::io("every sentence failed to decode"));
    }
    Ok(())
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_separated_sentences() {
        let dir = std::env::temp_dir().join(format!("reorder-main-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sentences.txt");
        std::fs::write(&path, "5 6\n7 8 9\n").unwrap();
        let sentences = parse_sentence_file(&path).unwrap();
        assert_eq!(sentences, vec![vec![5, 6], vec![7, 8, 9]]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn resolves_punctuation_ids_by_word_spelling() {
        let dir = std::env::temp_dir().join(format!("reorder-main-test-vocab-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let vocab_path = dir.join("vocab.tsv");
        std::fs::write(&vocab_path, "1\thello\n2\t.\n3\t,\n").unwrap();
        let vocab = Vocab::load(&vocab_path).unwrap();
        let punctuation: HashSet<String> = [".".to_string(), ",".to_string()].into_iter().collect();
        let ids = resolve_punctuation_ids(&vocab, &punctuation);
        assert_eq!(ids, HashSet::from([2, 3]));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn null_and_silly_chop_strategies() {
        let none = ChopStrategy::None;
        assert_eq!(compute_chop(&none, &[1, 2, 3], 1).unwrap(), vec![3]);

        let silly = ChopStrategy::Silly { max_num_words: 2 };
        assert_eq!(compute_chop(&silly, &[1, 2, 3, 4, 5], 1).unwrap(), vec![2, 4, 5]);
    }

    #[test]
    fn from_file_chop_strategy_reads_the_matching_line() {
        let strategy = ChopStrategy::FromFile { lines: vec!["2 4".to_string()] };
        assert_eq!(compute_chop(&strategy, &[1, 2, 3, 4], 1).unwrap(), vec![2, 4]);
    }

    #[test]
    fn all_reorderable_constraints_default_to_true() {
        let strategy = ConstraintsStrategy::AllReorderable;
        assert_eq!(compute_constraints(&strategy, 3, 1).unwrap(), vec![true, true, true]);
    }

    #[test]
    fn from_file_constraints_parse_the_matching_line() {
        let strategy = ConstraintsStrategy::FromFile { lines: vec!["01".to_string()] };
        assert_eq!(compute_constraints(&strategy, 2, 1).unwrap(), vec![false, true]);
    }
}
