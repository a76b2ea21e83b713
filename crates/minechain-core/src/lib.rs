use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod constants;
pub mod mine;

use constants::{CANONICAL_HEADER_SIZE, HASH_SIZE, MAX_DIFFICULTY, NONCE_INPUT_SIZE};

pub type Hash = [u8; 32];

/// A single ledger entry. `hash` commits to the canonical fields (index,
/// timestamp, previous_hash, data); `nonced_hash` seals that commitment
/// against the difficulty target and is what the next block links to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub previous_hash: Hash,
    pub hash: Hash,
    pub data: String,
    pub difficulty: u32,
    pub nonce: u64,
    pub nonced_hash: Hash,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}

/// Digest of `[32B identity hash][8B nonce LE]`.
pub fn nonced_hash(identity: &Hash, nonce: u64) -> Hash {
    let mut bytes = [0u8; NONCE_INPUT_SIZE];
    bytes[..HASH_SIZE].copy_from_slice(identity);
    bytes[HASH_SIZE..].copy_from_slice(&nonce.to_le_bytes());
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

impl Block {
    /// First block of a chain. Difficulty 0, zeroed previous hash, and the
    /// nonce/nonced hash left at their defaults (difficulty 0 needs no seal).
    pub fn genesis(data: impl Into<String>) -> Self {
        let mut block = Self {
            index: 0,
            timestamp: unix_now(),
            previous_hash: [0u8; 32],
            hash: [0u8; 32],
            data: data.into(),
            difficulty: 0,
            nonce: 0,
            nonced_hash: [0u8; 32],
        };
        block.hash = block.compute_hash();
        block
    }

    /// An unsealed successor of `previous`. The caller must mine it before
    /// submitting it to a chain with difficulty > 0.
    pub fn next(previous: &Block, data: impl Into<String>, difficulty: u32) -> Self {
        debug_assert!(difficulty <= MAX_DIFFICULTY);
        let mut block = Self {
            index: previous.index + 1,
            timestamp: unix_now(),
            previous_hash: previous.nonced_hash,
            hash: [0u8; 32],
            data: data.into(),
            difficulty,
            nonce: 0,
            nonced_hash: [0u8; 32],
        };
        block.hash = block.compute_hash();
        block
    }

    /// Canonical byte layout the identity hash commits to:
    /// `[8B index LE][8B unix-seconds LE][32B previous_hash][data]`.
    /// Hash input only, never stored or transmitted.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(CANONICAL_HEADER_SIZE + self.data.len());
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.previous_hash);
        bytes.extend_from_slice(self.data.as_bytes());
        bytes
    }

    pub fn compute_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }

    pub fn compute_nonced_hash(&self) -> Hash {
        nonced_hash(&self.hash, self.nonce)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------------- block {} ----------------", self.index)?;
        writeln!(f, "timestamp:     {}", self.timestamp)?;
        writeln!(f, "previous hash: {}", hex::encode(self.previous_hash))?;
        writeln!(f, "identity hash: {}", hex::encode(self.hash))?;
        writeln!(f, "data:          {}", self.data)?;
        writeln!(f, "difficulty:    {}", self.difficulty)?;
        writeln!(f, "nonce:         {}", self.nonce)?;
        writeln!(f, "nonced hash:   {}", hex::encode(self.nonced_hash))
    }
}

pub mod pow {
    use super::{Block, Hash};
    use crate::constants::HASH_SIZE;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Nonces checked between looks at the stop flag.
    const CANCEL_STRIDE: u64 = 1 << 10;

    /// Leading-zero-bit check used for sealing. All `difficulty / 8` leading
    /// bytes must be zero, and the low `difficulty % 8` bits (LSB-first) of
    /// the byte at offset `difficulty / 8 + 1` must be zero. That offset is
    /// one past the zero run and decides which nonces seal a block; it must
    /// not move. A probe past the end of the hash reads as zero, keeping the
    /// function total up to difficulty 256.
    pub fn difficulty_satisfied(hash: &Hash, difficulty: u32) -> bool {
        let full_zero_bytes = (difficulty as usize / 8).min(HASH_SIZE);
        if hash[..full_zero_bytes].iter().any(|b| *b != 0) {
            return false;
        }
        let remainder_bits = difficulty % 8;
        if remainder_bits == 0 {
            return true;
        }
        let probe = hash.get(full_zero_bytes + 1).copied().unwrap_or(0);
        probe & ((1u8 << remainder_bits) - 1) == 0
    }

    /// Mine the block by incrementing the nonce from its current value until
    /// the nonced hash satisfies the block's difficulty. Blocking and
    /// unbounded; expected ~2^difficulty attempts.
    pub fn mine(mut block: Block) -> Block {
        loop {
            let nonced = block.compute_nonced_hash();
            if difficulty_satisfied(&nonced, block.difficulty) {
                block.nonced_hash = nonced;
                return block;
            }
            block.nonce = block.nonce.wrapping_add(1);
        }
    }

    /// Like `mine`, but gives up and returns `None` once `stop` is raised.
    /// The flag is consulted every `CANCEL_STRIDE` nonces.
    pub fn mine_with_cancel(mut block: Block, stop: &AtomicBool) -> Option<Block> {
        loop {
            for _ in 0..CANCEL_STRIDE {
                let nonced = block.compute_nonced_hash();
                if difficulty_satisfied(&nonced, block.difficulty) {
                    block.nonced_hash = nonced;
                    return Some(block);
                }
                block.nonce = block.nonce.wrapping_add(1);
            }
            if stop.load(Ordering::Relaxed) {
                return None;
            }
        }
    }
}

pub mod chain {
    use super::{pow, Block};
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;
    use tracing::warn;

    /// Reason a candidate was refused. The pass/fail contract is the boolean
    /// result; the variant exists for logging and diagnostics only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    pub enum SuccessorError {
        #[error("index {candidate} does not follow {previous}")]
        IndexMismatch { previous: u64, candidate: u64 },
        #[error("previous-hash link does not match the tip's nonced hash")]
        LinkageMismatch,
        #[error("stored identity hash does not match the recomputed one")]
        IdentityMismatch,
        #[error("nonced hash does not satisfy difficulty {difficulty}")]
        DifficultyNotSatisfied { difficulty: u32 },
    }

    /// The four linkage checks, in order, short-circuiting on the first
    /// failure. The candidate's identity hash and nonced hash are both
    /// recomputed; only the predecessor's stored seal is taken as-is, since
    /// a genesis block carries a zeroed seal by construction.
    pub fn validate_successor(previous: &Block, candidate: &Block) -> Result<(), SuccessorError> {
        if previous.index + 1 != candidate.index {
            return Err(SuccessorError::IndexMismatch {
                previous: previous.index,
                candidate: candidate.index,
            });
        }
        if previous.nonced_hash != candidate.previous_hash {
            return Err(SuccessorError::LinkageMismatch);
        }
        if candidate.compute_hash() != candidate.hash {
            return Err(SuccessorError::IdentityMismatch);
        }
        if !pow::difficulty_satisfied(&candidate.compute_nonced_hash(), candidate.difficulty) {
            return Err(SuccessorError::DifficultyNotSatisfied {
                difficulty: candidate.difficulty,
            });
        }
        Ok(())
    }

    pub fn is_valid_successor(previous: &Block, candidate: &Block) -> bool {
        match validate_successor(previous, candidate) {
            Ok(()) => true,
            Err(reason) => {
                warn!(index = candidate.index, %reason, "rejected candidate block");
                false
            }
        }
    }

    /// Append-only block sequence, never empty. Methods take `&mut self`, so
    /// read-tip/validate/append is one critical section per writer; shared
    /// use goes through a lock owning the whole value.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Chain {
        blocks: Vec<Block>,
    }

    impl Chain {
        pub fn genesis(data: impl Into<String>) -> Self {
            Self {
                blocks: vec![Block::genesis(data)],
            }
        }

        pub fn len(&self) -> usize {
            self.blocks.len()
        }

        pub fn is_empty(&self) -> bool {
            self.blocks.is_empty()
        }

        pub fn tip(&self) -> &Block {
            self.blocks.last().expect("chain holds at least the genesis block")
        }

        pub fn blocks(&self) -> &[Block] {
            &self.blocks
        }

        /// Validate `block` against the tip; push it on success. Rejection is
        /// a normal outcome: the chain is left untouched and `false` comes
        /// back.
        pub fn append_block(&mut self, block: Block) -> bool {
            if is_valid_successor(self.tip(), &block) {
                self.blocks.push(block);
                return true;
            }
            false
        }

        /// Build a successor over `data`, mine it synchronously, and append
        /// it. Blocks the caller for the whole mining duration.
        pub fn append_data(&mut self, data: impl Into<String>, difficulty: u32) -> bool {
            let block = pow::mine(Block::next(self.tip(), data, difficulty));
            self.append_block(block)
        }
    }

    impl fmt::Display for Chain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for block in &self.blocks {
                write!(f, "{block}")?;
            }
            Ok(())
        }
    }
}
