use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display};

use crate::errors::IdentityError;
use crate::normalize::{normalize_allele, normalize_chrom, normalize_coding, normalize_protein};

/// The representation levels a variant identity can carry, in resolution
/// preference order. Protein identity is the most clinically stable key
/// and always takes precedence; transcript churn must not cause tier
/// flicker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityLevel {
    Protein,
    Coding,
    Genomic,
}

impl IdentityLevel {
    /// All levels, most preferred first.
    pub const PREFERENCE: [IdentityLevel; 3] = [
        IdentityLevel::Protein,
        IdentityLevel::Coding,
        IdentityLevel::Genomic,
    ];

    fn tag(self) -> &'static str {
        match self {
            IdentityLevel::Protein => "p",
            IdentityLevel::Coding => "c",
            IdentityLevel::Genomic => "g",
        }
    }
}

/// A normalized comparison key at a specific representation level.
/// This is what the annotation store indexes records by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    pub level: IdentityLevel,
    pub key: String,
}

/// One representation of a variant: the verbatim (trimmed) input kept for
/// display, and the normalized key used for comparison and store lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Representation {
    pub display: String,
    pub key: String,
}

/// A genomic locus in chromosome / position / ref / alt form.
/// Fields are stored normalized (no `chr` prefix, uppercase alleles).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicLocus {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt_allele: String,
}

impl GenomicLocus {
    pub fn new(chrom: &str, pos: u64, ref_allele: &str, alt_allele: &str) -> Self {
        Self {
            chrom: normalize_chrom(chrom),
            pos,
            ref_allele: normalize_allele(ref_allele),
            alt_allele: normalize_allele(alt_allele),
        }
    }

    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}/{}",
            self.chrom, self.pos, self.ref_allele, self.alt_allele
        )
    }
}

impl Display for GenomicLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Raw variant observation fields as they come off a sample's call set.
/// All fields are optional; identity construction fails only when none of
/// the three representations can be derived.
#[derive(Debug, Clone, Default)]
pub struct RawObservation {
    pub hgvsp: Option<String>,
    pub hgvsc: Option<String>,
    pub chrom: Option<String>,
    pub pos: Option<u64>,
    pub ref_allele: Option<String>,
    pub alt_allele: Option<String>,
}

/// Immutable identity of an observed variant, carrying up to three
/// representations. Callers supply every representation they have so
/// resolution can fall back from protein to coding to genomic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantIdentity {
    pub protein: Option<Representation>,
    pub coding: Option<Representation>,
    pub genomic: Option<GenomicLocus>,
}

impl VariantIdentity {
    /// Build an identity from explicit parts. At least one representation
    /// must survive normalization.
    pub fn from_parts(
        hgvsp: Option<&str>,
        hgvsc: Option<&str>,
        genomic: Option<GenomicLocus>,
    ) -> Result<Self, IdentityError> {
        let identity = Self {
            protein: hgvsp.and_then(normalize_protein),
            coding: hgvsc.and_then(normalize_coding),
            genomic,
        };
        if identity.protein.is_none() && identity.coding.is_none() && identity.genomic.is_none() {
            return Err(IdentityError::Malformed(format!(
                "hgvsp={:?} hgvsc={:?}",
                hgvsp, hgvsc
            )));
        }
        Ok(identity)
    }

    /// Build an identity from a raw call-set observation. A genomic locus
    /// requires all four of chrom/pos/ref/alt; partial loci are ignored
    /// rather than guessed at.
    pub fn from_observation(raw: &RawObservation) -> Result<Self, IdentityError> {
        let genomic = match (&raw.chrom, raw.pos, &raw.ref_allele, &raw.alt_allele) {
            (Some(chrom), Some(pos), Some(r), Some(a))
                if !chrom.trim().is_empty() && !r.trim().is_empty() && !a.trim().is_empty() =>
            {
                Some(GenomicLocus::new(chrom, pos, r, a))
            }
            _ => None,
        };
        Self::from_parts(raw.hgvsp.as_deref(), raw.hgvsc.as_deref(), genomic)
    }

    /// The comparison key at a given level, if that representation exists.
    pub fn key_at(&self, level: IdentityLevel) -> Option<IdentityKey> {
        let key = match level {
            IdentityLevel::Protein => self.protein.as_ref().map(|r| r.key.clone()),
            IdentityLevel::Coding => self.coding.as_ref().map(|r| r.key.clone()),
            IdentityLevel::Genomic => self.genomic.as_ref().map(|g| g.key()),
        };
        key.map(|key| IdentityKey { level, key })
    }

    /// All keys this identity carries, most preferred first.
    pub fn keys(&self) -> Vec<IdentityKey> {
        IdentityLevel::PREFERENCE
            .iter()
            .filter_map(|&level| self.key_at(level))
            .collect()
    }

    /// Whether this identity matches the given store key.
    pub fn has_key(&self, key: &IdentityKey) -> bool {
        self.key_at(key.level).as_ref() == Some(key)
    }

    /// Stable digest over the normalized key set. Used as the snapshot
    /// idempotency key and anywhere a compact identity handle is needed.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for k in self.keys() {
            hasher.update(k.level.tag().as_bytes());
            hasher.update(b"=");
            hasher.update(k.key.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Best human-readable form, for log lines and failure reports.
    pub fn label(&self) -> String {
        if let Some(p) = &self.protein {
            p.display.clone()
        } else if let Some(c) = &self.coding {
            c.display.clone()
        } else if let Some(g) = &self.genomic {
            g.key()
        } else {
            // Unreachable for identities built through the constructors.
            String::from("<no identity>")
        }
    }
}

impl Display for VariantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
