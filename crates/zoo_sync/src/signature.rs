//! MinHash signatures of the sequences in a cell.
//!
//! A signature keeps the `num` smallest hashes of all canonical k-mers
//! seen (a bottom-k sketch). Two cells' signatures estimate the Jaccard
//! similarity of their k-mer sets without holding either set in memory.
//!
//! Sketches hash k-mers and serialize the way sourmash does, so a `.zoo`
//! file can be loaded and compared by sourmash tooling:
//!
//! ```text
//! [
//!   {
//!     "class": "sourmash_signature",
//!     "email": "",
//!     "filename": "",
//!     "hash_function": "0.murmur64",
//!     "license": "CC0",
//!     "name": "survey",
//!     "signatures": [
//!       { "ksize": 16, "max_hash": 0, "md5sum": "...", "mins": [...],
//!         "molecule": "DNA", "num": 1000, "seed": 42 }
//!     ],
//!     "version": 0.4
//!   }
//! ]
//! ```

use crate::error::SyncResult;
use md5::{Digest, Md5};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{Cursor, Write};

/// Seed of the k-mer hash.
pub const HASH_SEED: u32 = 42;

const HASH_FUNCTION: &str = "0.murmur64";
const SIGNATURE_CLASS: &str = "sourmash_signature";
const SIGNATURE_VERSION: f64 = 0.4;

/// Something that can absorb DNA sequences.
pub trait SignatureSink {
    /// Folds one sequence in. Case is ignored; k-mers containing anything
    /// other than `ACGT` are skipped.
    fn add_sequence(&mut self, sequence: &str);
}

/// A bottom-`num` MinHash sketch for one k-mer size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHash {
    ksize: usize,
    num: usize,
    mins: BTreeSet<u64>,
}

impl MinHash {
    /// Creates an empty sketch.
    pub fn new(ksize: usize, num: usize) -> Self {
        Self {
            ksize,
            num,
            mins: BTreeSet::new(),
        }
    }

    /// k-mer size.
    pub fn ksize(&self) -> usize {
        self.ksize
    }

    /// Maximum number of hashes kept.
    pub fn num(&self) -> usize {
        self.num
    }

    /// The hashes kept, ascending.
    pub fn mins(&self) -> impl Iterator<Item = u64> + '_ {
        self.mins.iter().copied()
    }

    /// Offers one hash to the sketch.
    pub fn add_hash(&mut self, hash: u64) {
        if self.mins.len() < self.num {
            self.mins.insert(hash);
        } else if self.mins.last().is_some_and(|&max| hash < max) && self.mins.insert(hash) {
            self.mins.pop_last();
        }
    }

    /// Checksum sourmash stores with each sketch: the MD5 of the k-mer size
    /// followed by every kept hash, all in decimal.
    pub fn md5sum(&self) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.ksize.to_string());
        for hash in &self.mins {
            hasher.update(hash.to_string());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Estimated Jaccard similarity with another sketch of the same k.
    ///
    /// Returns `None` when the k-mer sizes differ.
    pub fn jaccard(&self, other: &Self) -> Option<f64> {
        if self.ksize != other.ksize {
            return None;
        }
        let union: BTreeSet<u64> = self
            .mins
            .union(&other.mins)
            .copied()
            .take(self.num.min(other.num))
            .collect();
        if union.is_empty() {
            return Some(0.0);
        }
        let shared = union
            .iter()
            .filter(|h| self.mins.contains(h) && other.mins.contains(h))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = shared as f64 / union.len() as f64;
        Some(ratio)
    }
}

impl SignatureSink for MinHash {
    fn add_sequence(&mut self, sequence: &str) {
        let bases = sequence.as_bytes().to_ascii_uppercase();
        if bases.len() < self.ksize {
            return;
        }
        for kmer in bases.windows(self.ksize) {
            if !kmer.iter().all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')) {
                continue;
            }
            self.add_hash(hash_kmer(&canonical_kmer(kmer)));
        }
    }
}

/// The lexically smaller of a k-mer and its reverse complement.
fn canonical_kmer(kmer: &[u8]) -> Vec<u8> {
    let reverse: Vec<u8> = kmer
        .iter()
        .rev()
        .map(|b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            _ => b'A',
        })
        .collect();
    if reverse.as_slice() < kmer {
        reverse
    } else {
        kmer.to_vec()
    }
}

/// First half of the 128-bit x64 MurmurHash3 of a k-mer, seeded with
/// [`HASH_SEED`].
#[allow(clippy::cast_possible_truncation)]
pub fn hash_kmer(kmer: &[u8]) -> u64 {
    // Reading from memory cannot fail.
    murmur3::murmur3_x64_128(&mut Cursor::new(kmer), HASH_SEED).unwrap_or_default() as u64
}

/// One sketch per k-mer size, named after the cell they summarize.
#[derive(Debug, Clone)]
pub struct SignatureSet {
    name: String,
    sketches: Vec<MinHash>,
    sequences: usize,
}

impl SignatureSet {
    /// Creates empty sketches for each size in `ksizes`.
    pub fn new(name: impl Into<String>, ksizes: &[usize], num: usize) -> Self {
        Self {
            name: name.into(),
            sketches: ksizes.iter().map(|&k| MinHash::new(k, num)).collect(),
            sequences: 0,
        }
    }

    /// Name of the set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sketches, in the order their sizes were given.
    pub fn sketches(&self) -> &[MinHash] {
        &self.sketches
    }

    /// Number of sequences folded in.
    pub fn sequences(&self) -> usize {
        self.sequences
    }

    /// Writes the set as a sourmash signature list, one signature per
    /// k-mer size, in indented JSON.
    pub fn save_json<W: Write>(&self, writer: W) -> SyncResult<()> {
        let file: Vec<SignatureRecord<'_>> = self
            .sketches
            .iter()
            .map(|sketch| SignatureRecord {
                class: SIGNATURE_CLASS,
                email: "",
                filename: "",
                hash_function: HASH_FUNCTION,
                license: "CC0",
                name: &self.name,
                signatures: [SketchEntry {
                    ksize: sketch.ksize,
                    max_hash: 0,
                    md5sum: sketch.md5sum(),
                    mins: sketch.mins().collect(),
                    molecule: "DNA",
                    num: sketch.num,
                    seed: HASH_SEED,
                }],
                version: SIGNATURE_VERSION,
            })
            .collect();
        serde_json::to_writer_pretty(writer, &file)?;
        Ok(())
    }
}

impl SignatureSink for SignatureSet {
    fn add_sequence(&mut self, sequence: &str) {
        for sketch in &mut self.sketches {
            sketch.add_sequence(sequence);
        }
        self.sequences += 1;
    }
}

// Fields are declared in key order so the output matches sourmash's
// sorted-key files.
#[derive(Serialize)]
struct SignatureRecord<'a> {
    class: &'static str,
    email: &'static str,
    filename: &'static str,
    hash_function: &'static str,
    license: &'static str,
    name: &'a str,
    signatures: [SketchEntry; 1],
    version: f64,
}

#[derive(Serialize)]
struct SketchEntry {
    ksize: usize,
    max_hash: u64,
    md5sum: String,
    mins: Vec<u64>,
    molecule: &'static str,
    num: usize,
    seed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_smallest_hashes() {
        let mut sketch = MinHash::new(4, 3);
        for h in [50, 10, 40, 20, 30, 10] {
            sketch.add_hash(h);
        }
        assert_eq!(sketch.mins().collect::<Vec<_>>(), [10, 20, 30]);
    }

    #[test]
    fn kmers_hash_like_sourmash() {
        assert_eq!(hash_kmer(b"ACG"), 1_731_421_407_650_554_201);
        assert_eq!(hash_kmer(b"CGT"), 12_839_520_591_576_847_817);

        let mut sketch = MinHash::new(3, 10);
        sketch.add_sequence("CGT");
        assert_eq!(sketch.mins().collect::<Vec<_>>(), [1_731_421_407_650_554_201]);
    }

    #[test]
    fn md5sum_covers_ksize_and_mins() {
        let mut sketch = MinHash::new(3, 10);
        for h in [30, 10, 20] {
            sketch.add_hash(h);
        }
        assert_eq!(sketch.md5sum(), "1568c45adabfcb580e02eed93643739c");
    }

    #[test]
    fn reverse_complements_hash_alike() {
        let mut forward = MinHash::new(5, 100);
        let mut reverse = MinHash::new(5, 100);
        forward.add_sequence("ACGTTGCAAG");
        reverse.add_sequence("CTTGCAACGT");
        assert_eq!(forward, reverse);
        assert_eq!(forward.jaccard(&reverse), Some(1.0));
    }

    #[test]
    fn case_is_ignored_and_ambiguous_windows_skipped() {
        let mut upper = MinHash::new(3, 100);
        let mut lower = MinHash::new(3, 100);
        upper.add_sequence("ACGTA");
        lower.add_sequence("acgta");
        assert_eq!(upper, lower);

        let mut ambiguous = MinHash::new(3, 100);
        ambiguous.add_sequence("ACNGT");
        assert_eq!(ambiguous.mins().count(), 0);

        let mut short = MinHash::new(10, 100);
        short.add_sequence("ACGT");
        assert_eq!(short.mins().count(), 0);
    }

    #[test]
    fn jaccard_of_disjoint_and_mismatched_sketches() {
        let mut a = MinHash::new(4, 50);
        let mut b = MinHash::new(4, 50);
        a.add_sequence("AAAAAAAA");
        b.add_sequence("CACACACA");
        assert_eq!(a.jaccard(&b), Some(0.0));
        assert_eq!(a.jaccard(&MinHash::new(5, 50)), None);
    }

    #[test]
    fn set_saves_one_sourmash_signature_per_ksize() {
        let mut set = SignatureSet::new("survey", &[3, 5], 10);
        set.add_sequence("ACGTACGTAC");
        set.add_sequence("TTTTGGGGCC");
        assert_eq!(set.sequences(), 2);
        assert!(set.sketches().iter().all(|s| s.mins().count() > 0));

        let mut out = Vec::new();
        set.save_json(&mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first["class"], "sourmash_signature");
        assert_eq!(first["hash_function"], "0.murmur64");
        assert_eq!(first["name"], "survey");
        assert_eq!(first["version"], 0.4);
        assert_eq!(first["email"], "");

        let sketch = &records[1]["signatures"][0];
        assert_eq!(sketch["ksize"], 5);
        assert_eq!(sketch["num"], 10);
        assert_eq!(sketch["seed"], 42);
        assert_eq!(sketch["max_hash"], 0);
        assert_eq!(sketch["molecule"], "DNA");
        assert_eq!(sketch["md5sum"], set.sketches()[1].md5sum());
        assert!(sketch["mins"].as_array().unwrap().len() <= 10);
    }
}
