use std::collections::BTreeMap;

use crate::config::ReconcilerConfig;
use crate::{Error, TextCandidate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

lazy_static! {
    /// Character pairs an OCR engine commonly confuses. Substitutions
    /// within a pair cost [`ConfusionTable::CONFUSED_COST`] instead of
    /// the full unit cost.
    static ref CONFUSION_PAIRS: Vec<(char, char)> = vec![
        ('0', 'O'),
        ('0', 'D'),
        ('O', 'D'),
        ('1', 'I'),
        ('1', 'L'),
        ('1', 'T'),
        ('2', 'Z'),
        ('3', 'J'),
        ('4', 'A'),
        ('5', 'S'),
        ('6', 'G'),
        ('8', 'B'),
    ];
}

/// Structural description of a valid plate string: a fixed-length digit
/// province code, then a run of letters, then a run of digits.
///
/// The default matches the Turkish format: 2 digits, 1-3 letters,
/// 2-4 digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateGrammar {
    pub prefix_digits: usize,
    pub min_letters: usize,
    pub max_letters: usize,
    pub min_suffix_digits: usize,
    pub max_suffix_digits: usize,
}

impl Default for PlateGrammar {
    fn default() -> Self {
        PlateGrammar {
            prefix_digits: 2,
            min_letters: 1,
            max_letters: 3,
            min_suffix_digits: 2,
            max_suffix_digits: 4,
        }
    }
}

impl PlateGrammar {
    pub fn validate(&self) -> Result<(), Error> {
        if self.prefix_digits == 0 {
            return Err(Error::InvalidGrammar(
                "prefix_digits must be at least 1".into(),
            ));
        }
        if self.min_letters == 0 || self.min_letters > self.max_letters {
            return Err(Error::InvalidGrammar(format!(
                "letter run bounds are inconsistent: {}..={}",
                self.min_letters, self.max_letters
            )));
        }
        if self.min_suffix_digits == 0 || self.min_suffix_digits > self.max_suffix_digits {
            return Err(Error::InvalidGrammar(format!(
                "suffix digit bounds are inconsistent: {}..={}",
                self.min_suffix_digits, self.max_suffix_digits
            )));
        }
        Ok(())
    }

    /// Shortest string length the grammar accepts.
    pub fn min_len(&self) -> usize {
        self.prefix_digits + self.min_letters + self.min_suffix_digits
    }

    /// Longest string length the grammar accepts.
    pub fn max_len(&self) -> usize {
        self.prefix_digits + self.max_letters + self.max_suffix_digits
    }

    /// Returns true when `text` is a well-formed plate under this grammar.
    ///
    /// Expects normalized input (uppercase ASCII alphanumeric).
    pub fn matches(&self, text: &str) -> bool {
        let bytes = text.as_bytes();
        if bytes.len() < self.min_len() || bytes.len() > self.max_len() {
            return false;
        }

        let mut idx = 0;
        let mut digits = 0;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            digits += 1;
            idx += 1;
        }
        if digits != self.prefix_digits {
            return false;
        }

        let mut letters = 0;
        while idx < bytes.len() && bytes[idx].is_ascii_uppercase() {
            letters += 1;
            idx += 1;
        }
        if letters < self.min_letters || letters > self.max_letters {
            return false;
        }

        let suffix = bytes.len() - idx;
        if suffix < self.min_suffix_digits || suffix > self.max_suffix_digits {
            return false;
        }
        bytes[idx..].iter().all(|b| b.is_ascii_digit())
    }
}

/// Substitution costs between characters for the correction search.
///
/// Pairs an OCR engine commonly mixes up substitute cheaply; everything
/// else costs a full unit, same as an insertion or deletion.
#[derive(Debug, Clone)]
pub struct ConfusionTable {
    pairs: Vec<(char, char)>,
}

impl Default for ConfusionTable {
    fn default() -> Self {
        ConfusionTable {
            pairs: CONFUSION_PAIRS.clone(),
        }
    }
}

impl ConfusionTable {
    const CONFUSED_COST: f32 = 0.25;
    const UNIT_COST: f32 = 1.0;

    /// Returns a table with an explicit set of confusable pairs.
    pub fn new(pairs: Vec<(char, char)>) -> ConfusionTable {
        ConfusionTable { pairs }
    }

    /// Cost of substituting `a` with `b`.
    pub fn substitution_cost(&self, a: char, b: char) -> f32 {
        if a == b {
            0.0
        } else if self
            .pairs
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
        {
            Self::CONFUSED_COST
        } else {
            Self::UNIT_COST
        }
    }

    /// Cost of inserting or deleting any character.
    pub fn indel_cost(&self) -> f32 {
        Self::UNIT_COST
    }

    /// The characters `c` is confusable with, not including `c` itself.
    pub fn alternatives(&self, c: char) -> impl Iterator<Item = char> + '_ {
        self.pairs.iter().filter_map(move |&(x, y)| {
            if x == c {
                Some(y)
            } else if y == c {
                Some(x)
            } else {
                None
            }
        })
    }
}

/// Weighted Levenshtein distance between two normalized strings, with
/// substitution costs taken from the confusion table.
pub fn weighted_edit_distance(a: &str, b: &str, table: &ConfusionTable) -> f32 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();

    let mut prev = (0..=b.len())
        .map(|j| j as f32 * table.indel_cost())
        .collect::<Vec<_>>();
    let mut current = vec![0.0f32; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i as f32 * table.indel_cost();
        for j in 1..=b.len() {
            let substitution = prev[j - 1] + table.substitution_cost(a[i - 1], b[j - 1]);
            let deletion = prev[j] + table.indel_cost();
            let insertion = current[j - 1] + table.indel_cost();
            current[j] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

/// Uppercase the string and strip everything but ASCII alphanumerics.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// The final plate reading for one identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledPlate {
    track_id: u64,
    text: String,
    is_format_valid: bool,
    evidence_count: usize,
}

impl ReconciledPlate {
    /// Return the identity this plate belongs to
    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    /// Return the final plate string
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true when the final string satisfies the target grammar.
    pub fn is_format_valid(&self) -> bool {
        self.is_format_valid
    }

    /// Number of OCR readings that support the final string.
    pub fn evidence_count(&self) -> usize {
        self.evidence_count
    }
}

/// Per-string evidence accumulated across an identity's lifetime.
#[derive(Debug, Clone, Default)]
struct Evidence {
    /// Observation count, discounted for corrected strings.
    weight: f32,
    /// Cumulative OCR confidence.
    confidence: f32,
    /// Raw observation count.
    observations: usize,
}

/// Collapses the OCR readings of one identity into a single validated
/// plate string.
///
/// Frequency comes first: with any directly observed well-formed string,
/// the most frequent one wins and correction never runs. Only when every
/// observation is malformed does the reconciler try to repair readings
/// through the confusion table, and a repaired string competes with a
/// discounted weight so it can never outvote direct evidence.
#[derive(Debug, Clone)]
pub struct PlateReconciler {
    config: ReconcilerConfig,
    table: ConfusionTable,
}

impl PlateReconciler {
    /// Longest normalized string the correction search will expand; the
    /// variant set is exponential in string length.
    const MAX_CORRECTION_LEN: usize = 10;

    /// Returns a new PlateReconciler, or an error when the configuration
    /// is invalid.
    pub fn new(config: ReconcilerConfig) -> Result<PlateReconciler, Error> {
        config.validate()?;
        Ok(PlateReconciler {
            config,
            table: ConfusionTable::default(),
        })
    }

    /// Reconcile one identity's candidates into a final plate.
    ///
    /// # Parameters
    ///
    /// * `track_id`: The identity being reconciled.
    /// * `candidates`: Every OCR reading collected for the identity, in
    ///   any order. The result depends only on the multiset.
    pub fn reconcile(&self, track_id: u64, candidates: &[TextCandidate]) -> ReconciledPlate {
        if candidates.is_empty() {
            warn!(track_id, "no OCR evidence collected for identity");
            return ReconciledPlate {
                track_id,
                text: String::new(),
                is_format_valid: false,
                evidence_count: 0,
            };
        }

        // BTreeMap keeps selection deterministic regardless of input order.
        let mut tally: BTreeMap<String, Evidence> = BTreeMap::new();
        for candidate in candidates {
            let normalized = normalize(candidate.text());
            if normalized.is_empty() {
                continue;
            }
            let evidence = tally.entry(normalized).or_default();
            evidence.weight += 1.0;
            evidence.confidence += candidate.confidence();
            evidence.observations += 1;
        }

        let valid: BTreeMap<&str, &Evidence> = tally
            .iter()
            .filter(|(text, _)| self.config.grammar.matches(text))
            .map(|(text, evidence)| (text.as_str(), evidence))
            .collect();

        if let Some(plate) = self.select(track_id, &valid) {
            return plate;
        }

        // No directly observed valid string: repair malformed readings
        // through the confusion table.
        let mut corrected: BTreeMap<String, Evidence> = BTreeMap::new();
        for (text, evidence) in &tally {
            if let Some(repair) = self.correct(text) {
                debug!(track_id, from = %text, to = %repair, "corrected OCR reading");
                let entry = corrected.entry(repair).or_default();
                entry.weight += evidence.weight * self.config.correction_discount;
                entry.confidence += evidence.confidence * self.config.correction_discount;
                entry.observations += evidence.observations;
            }
        }
        let corrected_view: BTreeMap<&str, &Evidence> = corrected
            .iter()
            .map(|(text, evidence)| (text.as_str(), evidence))
            .collect();
        if let Some(plate) = self.select(track_id, &corrected_view) {
            return plate;
        }

        // Best effort: the single highest-confidence reading, flagged
        // as malformed.
        warn!(track_id, "no well-formed plate recoverable from evidence");
        let best = candidates
            .iter()
            .max_by(|a, b| {
                a.confidence()
                    .total_cmp(&b.confidence())
                    .then_with(|| normalize(b.text()).cmp(&normalize(a.text())))
            })
            .expect("candidates is non-empty");
        let text = normalize(best.text());
        let evidence_count = tally.get(&text).map(|e| e.observations).unwrap_or(0);
        ReconciledPlate {
            track_id,
            text,
            is_format_valid: false,
            evidence_count,
        }
    }

    /// Pick the winning string from an evidence map: highest weight, then
    /// highest cumulative confidence, then longest, then lexicographically
    /// smallest.
    fn select(
        &self,
        track_id: u64,
        evidence: &BTreeMap<&str, &Evidence>,
    ) -> Option<ReconciledPlate> {
        let (text, winner) = evidence.iter().fold(
            None::<(&str, &Evidence)>,
            |best, (&text, &candidate)| match best {
                None => Some((text, candidate)),
                Some((best_text, best_evidence)) => {
                    let ordering = candidate
                        .weight
                        .total_cmp(&best_evidence.weight)
                        .then_with(|| candidate.confidence.total_cmp(&best_evidence.confidence))
                        .then_with(|| text.len().cmp(&best_text.len()));
                    if ordering == std::cmp::Ordering::Greater {
                        Some((text, candidate))
                    } else {
                        // BTreeMap iteration is ascending, so on a full tie
                        // the earlier (lexicographically smaller) key stays.
                        Some((best_text, best_evidence))
                    }
                }
            },
        )?;

        Some(ReconciledPlate {
            track_id,
            text: text.to_string(),
            is_format_valid: true,
            evidence_count: winner.observations,
        })
    }

    /// Search the confusion-table neighborhood of `text` for the closest
    /// well-formed string within the edit-distance budget.
    fn correct(&self, text: &str) -> Option<String> {
        if text.len() > Self::MAX_CORRECTION_LEN {
            return None;
        }

        // Cartesian product of each position's confusable alternatives
        // (keeping the observed character as one option).
        let mut variants = vec![String::new()];
        for c in text.chars() {
            let mut options = vec![c];
            options.extend(self.table.alternatives(c));
            variants = variants
                .into_iter()
                .flat_map(|prefix| {
                    options.iter().map(move |&option| {
                        let mut variant = prefix.clone();
                        variant.push(option);
                        variant
                    })
                })
                .collect();
        }

        variants
            .into_iter()
            .filter(|variant| self.config.grammar.matches(variant))
            .map(|variant| {
                let distance = weighted_edit_distance(text, &variant, &self.table);
                (variant, distance)
            })
            .filter(|(_, distance)| *distance <= self.config.max_edit_distance)
            .min_by(|(a_text, a_dist), (b_text, b_dist)| {
                a_dist.total_cmp(b_dist).then_with(|| a_text.cmp(b_text))
            })
            .map(|(variant, _)| variant)
    }
}
