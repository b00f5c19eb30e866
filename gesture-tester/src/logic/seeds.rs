use anyhow::{Context, Result, bail};
use std::collections::HashMap;

/// Seed used when the command line names none.
pub const DEFAULT_SEED: u64 = 1337;

/// Upper bound on seeds produced by a single `a..b` range token.
const MAX_RANGE_SEEDS: u64 = 10_000;

/// Resolved seed plus the word it was derived from, when there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub label: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, label: None }
    }

    #[must_use]
    pub fn from_word(word: &str) -> Self {
        let label = word.to_ascii_lowercase();
        Self {
            seed: word_seed(&label),
            label: Some(label),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{label} ({})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed arguments into canonical seeds.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex,
/// half-open ranges such as `10..20`, and plain words, which hash to a
/// stable seed. Duplicates keep their first position.
///
/// # Errors
///
/// Returns an error for tokens that fit none of those shapes, and for ranges
/// that are empty or too large.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending = Vec::new();

    for token in tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let value = u64::from_str_radix(hex, 16)
                .with_context(|| format!("invalid hex seed: {token}"))?;
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            pending.extend(parse_range(token, start, end)?);
            continue;
        }

        if token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            pending.push(SeedInfo::from_word(token));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    for info in pending {
        if let Some(&existing) = index.get(&info.seed) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.label.is_none()
                && info.label.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}

fn parse_range(token: &str, start: &str, end: &str) -> Result<Vec<SeedInfo>> {
    let start: u64 = start
        .parse()
        .with_context(|| format!("invalid range start in {token}"))?;
    let end: u64 = end
        .parse()
        .with_context(|| format!("invalid range end in {token}"))?;
    if start >= end {
        bail!("Empty seed range: {token}");
    }
    if end - start > MAX_RANGE_SEEDS {
        bail!("Seed range {token} exceeds {MAX_RANGE_SEEDS} seeds");
    }
    Ok((start..end).map(SeedInfo::from_numeric).collect())
}

/// 64-bit FNV-1a.
fn word_seed(word: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    word.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
