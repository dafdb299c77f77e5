use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seeds swept by the `all` keyword.
const SWEEP_SEEDS: [u64; 8] = [
    1,
    7,
    42,
    1337,
    0xDA0_5EED,
    0xC0FF_EE00,
    0x5151_5151_5151_5151,
    u64::MAX,
];

const DEFAULT_SEED: u64 = 1337;

/// A resolved seed plus the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub label: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            label: seed.to_string(),
        }
    }

    #[must_use]
    pub fn from_hex(seed: u64) -> Self {
        Self {
            seed,
            label: format!("{seed:#x}"),
        }
    }
}

/// Resolve CLI seed tokens into unique seeds, in first-seen order.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hexadecimal literals, and the keyword `all` for the built-in sweep.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") {
            pending.extend(SWEEP_SEEDS.map(SeedInfo::from_numeric));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let Ok(value) = u64::from_str_radix(&hex.replace('_', ""), 16) else {
                bail!("Invalid hex seed: {token}");
            };
            pending.push(SeedInfo::from_hex(value));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff"])).unwrap();
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(values, vec![42, 7, 255]);
        assert_eq!(seeds[2].label, "0xff");
    }

    #[test]
    fn expands_sweep_and_dedupes() {
        let seeds = resolve_seed_inputs(&tokens(&["1337", "all"])).unwrap();
        assert_eq!(seeds.len(), SWEEP_SEEDS.len());
        assert_eq!(seeds[0].seed, 1337);
    }

    #[test]
    fn empty_input_uses_default_and_garbage_fails() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
        assert!(resolve_seed_inputs(&tokens(&["not-a-seed"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
