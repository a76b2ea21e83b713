use crate::pow::difficulty_satisfied;
use crate::{nonced_hash, Block};
use rayon::prelude::*;
use tracing::info;

/// Seals a block by searching the nonce space in parallel until a nonced
/// hash has the required leading zero bits. Rayon splits the range across
/// threads; any satisfying nonce is equally valid, so the first one found
/// wins. Exactly one nonce/nonced-hash pair ends up committed to the block.
pub fn mine_parallel(mut block: Block) -> Block {
    let identity = block.hash;
    let difficulty = block.difficulty;

    let found = (block.nonce..u64::MAX)
        .into_par_iter()
        .find_any(|nonce| difficulty_satisfied(&nonced_hash(&identity, *nonce), difficulty))
        .expect("nonce space exhausted (practically impossible)");

    block.nonce = found;
    block.nonced_hash = nonced_hash(&identity, found);
    info!(
        index = block.index,
        nonce = block.nonce,
        hash = %hex::encode(block.nonced_hash),
        "sealed block"
    );
    block
}
