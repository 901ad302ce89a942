//! SHA256 hashing, including the partial state used by midstate hashers.
//!
//! A hasher that only varies the tail of a message can start from the
//! compression state reached after the leading 64-byte blocks. That state is
//! the "midstate"; [`sha256_resume`] finishes the digest from it.

use sha2::digest::consts::U64;
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};

use crate::error::CoinbaseError;

/// SHA256 block size in bytes.
pub const SHA256_BLOCK_SIZE: usize = 64;

/// SHA256 initial hash value.
const SHA256_IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a,
    0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// This is used for transaction IDs.
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// Single SHA256 hash.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// SHA256 compression state after consuming a whole number of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Midstate {
    /// The eight working state words.
    pub state: [u32; 8],
    /// Number of message bytes already consumed.
    pub bytes_consumed: u64,
}

impl Midstate {
    /// State words serialized big-endian, the order hashing hardware expects.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Compute the midstate over `data`, which must be a whole number of blocks.
pub fn sha256_midstate(data: &[u8]) -> Result<Midstate, CoinbaseError> {
    if data.len() % SHA256_BLOCK_SIZE != 0 {
        return Err(CoinbaseError::UnalignedMidstate { len: data.len() });
    }

    let mut state = SHA256_IV;
    compress_blocks(&mut state, data);

    Ok(Midstate {
        state,
        bytes_consumed: data.len() as u64,
    })
}

/// Finish a SHA256 digest from `midstate`, feeding the remaining `tail`.
///
/// `sha256_resume(&sha256_midstate(head)?, tail) == sha256(head ++ tail)`.
pub fn sha256_resume(midstate: &Midstate, tail: &[u8]) -> [u8; 32] {
    let total_bits = (midstate.bytes_consumed + tail.len() as u64) * 8;

    let mut buffer = Vec::with_capacity(tail.len() + 2 * SHA256_BLOCK_SIZE);
    buffer.extend_from_slice(tail);
    buffer.push(0x80);
    while buffer.len() % SHA256_BLOCK_SIZE != SHA256_BLOCK_SIZE - 8 {
        buffer.push(0x00);
    }
    buffer.extend_from_slice(&total_bits.to_be_bytes());

    let mut state = midstate.state;
    compress_blocks(&mut state, &buffer);

    Midstate {
        state,
        bytes_consumed: 0,
    }
    .to_bytes()
}

fn compress_blocks(state: &mut [u32; 8], data: &[u8]) {
    let blocks: Vec<GenericArray<u8, U64>> = data
        .chunks_exact(SHA256_BLOCK_SIZE)
        .map(GenericArray::clone_from_slice)
        .collect();
    sha2::compress256(state, &blocks);
}

/// Reverse the byte order of a 32-byte array.
///
/// Bitcoin displays hashes in reverse byte order.
#[inline]
pub fn reverse_bytes(bytes: &[u8; 32]) -> [u8; 32] {
    let mut reversed = *bytes;
    reversed.reverse();
    reversed
}

/// Convert a hash to its display format (reversed hex).
pub fn hash_to_display_hex(hash: &[u8; 32]) -> String {
    hex::encode(reverse_bytes(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_sha256() {
        // Test vector: SHA256d("hello")
        let hash = double_sha256(b"hello");

        let expected = hex::decode(
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        ).unwrap();

        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_midstate_of_nothing_is_iv() {
        let midstate = sha256_midstate(&[]).unwrap();
        assert_eq!(midstate.state, SHA256_IV);
        assert_eq!(sha256_resume(&midstate, b""), sha256(b""));
    }

    #[test]
    fn test_resume_matches_full_digest() {
        let message: Vec<u8> = (0..200u16).map(|i| (i * 7) as u8).collect();

        for split in [0, 64, 128, 192] {
            let midstate = sha256_midstate(&message[..split]).unwrap();
            assert_eq!(midstate.bytes_consumed, split as u64);
            assert_eq!(
                sha256_resume(&midstate, &message[split..]),
                sha256(&message),
                "split at {}",
                split
            );
        }
    }

    #[test]
    fn test_resume_tail_lengths_around_padding_boundary() {
        let head = [0x5au8; 64];
        let midstate = sha256_midstate(&head).unwrap();

        for tail_len in [0, 1, 55, 56, 63, 64, 65, 119, 120] {
            let tail = vec![0xa5u8; tail_len];
            let mut full = head.to_vec();
            full.extend_from_slice(&tail);
            assert_eq!(sha256_resume(&midstate, &tail), sha256(&full), "tail {}", tail_len);
        }
    }

    #[test]
    fn test_midstate_rejects_partial_block() {
        assert_eq!(
            sha256_midstate(&[0u8; 65]),
            Err(CoinbaseError::UnalignedMidstate { len: 65 })
        );
    }

    #[test]
    fn test_reverse_bytes() {
        let mut original = [0u8; 32];
        for (i, b) in original.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        let reversed = reverse_bytes(&original);

        assert_eq!(reversed[0], 0x20);
        assert_eq!(reversed[31], 0x01);
        assert_eq!(&hash_to_display_hex(&original)[..2], "20");
    }
}
