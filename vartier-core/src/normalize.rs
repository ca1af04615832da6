//! Identity normalization.
//!
//! Canonicalizes the HGVS and locus strings coming off a sample's call set
//! so that equivalent observations compare equal. Normalization produces a
//! comparison *key*; the verbatim (trimmed) input is kept as the *display*
//! form for rendering.

use crate::models::identity::Representation;

/// Strip all whitespace from a string. HGVS strings carry no meaningful
/// whitespace, so `"p. V600E"` and `"p.V600E"` are the same change.
fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalize a protein-level HGVS string (`p.` form).
///
/// The comparison key drops a transcript/protein accession prefix
/// (`NP_000537.3:p.R273H` keys as `p.R273H`, the protein change is
/// transcript-independent) and unwraps the predicted-consequence
/// parentheses (`p.(V600E)` keys as `p.V600E`). Amino-acid case is
/// semantic and is preserved.
///
/// Returns `None` when the input is empty after trimming.
pub fn normalize_protein(raw: &str) -> Option<Representation> {
    let display = raw.trim();
    if display.is_empty() {
        return None;
    }

    let mut key = strip_ws(display);
    if let Some((_, change)) = key.rsplit_once(':') {
        key = change.to_string();
    }
    if let Some(inner) = key
        .strip_prefix("p.(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        key = format!("p.{}", inner);
    }
    if key.is_empty() {
        return None;
    }

    Some(Representation {
        display: display.to_string(),
        key,
    })
}

/// Normalize a transcript-level HGVS string (`c.` form).
///
/// The comparison key strips the transcript *version* suffix
/// (`NM_004333.4:c.1799T>A` keys as `NM_004333:c.1799T>A`) so that
/// re-annotation against a newer transcript release still matches prior
/// classifications. The display form retains the version.
pub fn normalize_coding(raw: &str) -> Option<Representation> {
    let display = raw.trim();
    if display.is_empty() {
        return None;
    }

    let compact = strip_ws(display);
    let key = match compact.split_once(':') {
        Some((accession, change)) => {
            let unversioned = accession
                .split_once('.')
                .map(|(base, _version)| base)
                .unwrap_or(accession);
            format!("{}:{}", unversioned, change)
        }
        None => compact,
    };
    if key.is_empty() {
        return None;
    }

    Some(Representation {
        display: display.to_string(),
        key,
    })
}

/// Normalize a chromosome name for locus keys: trim, strip a leading
/// `chr` prefix in any case, uppercase the remainder (`chrx` keys as `X`).
pub fn normalize_chrom(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("chr") {
        &trimmed[3..]
    } else {
        trimmed
    };
    stripped.to_ascii_uppercase()
}

/// Normalize an allele string for locus keys: trim and uppercase.
pub fn normalize_allele(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
