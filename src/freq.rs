use std::collections::BTreeMap;

use crate::error::{CumuloError, CumuloResult};

/// Phrase/word → emphasis weight handed to the packing engine.
/// Keys are unique and case-sensitive; iteration order is irrelevant.
pub type FrequencyMap = BTreeMap<String, f64>;

/// Tokenizer/stopword-filter collaborator used to derive a frequency map
/// from free description text.
pub trait Tokenize {
    fn process_text(&self, text: &str) -> FrequencyMap;
}

/// Blend user-weighted phrases with description-derived frequencies.
///
/// The weighting procedure is deliberately literal and must stay
/// numerically stable across releases; downstream output is compared
/// against rendered fixtures:
///
/// 1. empty description → the phrases, unchanged;
/// 2. empty phrases → the derived description map alone;
/// 3. if the lightest phrase weighs less than the heaviest description
///    word, every phrase gets that maximum added to it (uniform boost);
/// 4. each phrase then lands in the derived map at twice its
///    boosted-or-original weight, overwriting any description entry.
///
/// The caller's phrase map is never mutated; a fresh map is returned.
pub fn merge_frequencies(
    phrases: &FrequencyMap,
    description: &str,
    tokenizer: &dyn Tokenize,
) -> CumuloResult<FrequencyMap> {
    if phrases.is_empty() && description.is_empty() {
        return Err(CumuloError::input("please provide phrases or a description"));
    }

    if description.is_empty() {
        return Ok(phrases.clone());
    }

    let derived = tokenizer.process_text(description);
    if derived.is_empty() {
        // Description collapsed to nothing (stopwords only). Fall back to
        // the phrases, which must then carry the whole cloud.
        if phrases.is_empty() {
            return Err(CumuloError::input(
                "description contained no usable words and no phrases were given",
            ));
        }
        return Ok(phrases.clone());
    }

    if phrases.is_empty() {
        return Ok(derived);
    }

    let max_desc = derived.values().cloned().fold(f64::MIN, f64::max);
    let min_phrase = phrases.values().cloned().fold(f64::MAX, f64::min);

    let boost = if min_phrase < max_desc { max_desc } else { 0.0 };

    let mut merged = derived;
    for (phrase, weight) in phrases {
        merged.insert(phrase.clone(), (weight + boost) * 2.0);
    }

    Ok(merged)
}
