pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const CANONICAL_HEADER_SIZE: usize = 8 + 8 + HASH_SIZE;
pub const NONCE_INPUT_SIZE: usize = HASH_SIZE + 8;
pub const MAX_DIFFICULTY: u32 = HASH_SIZE as u32 * 8;
