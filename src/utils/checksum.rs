/// XOR checksum carried in every packet header.
pub struct CheckSum;

impl CheckSum {
    /// Folds the payload into 16 bits, alternating high and low bytes so that
    /// swapped neighbours change the result.
    pub fn new(payload: &[u8]) -> u16 {
        payload.chunks(2).fold(0u16, |checksum, pair| {
            let high = pair[0] as u16;
            let low = pair.get(1).copied().unwrap_or(0) as u16;
            checksum ^ ((high << 8) | low)
        })
    }

    /// Returns `true` when `checksum` matches the payload.
    pub fn check(checksum: u16, payload: &[u8]) -> bool {
        CheckSum::new(payload) == checksum
    }
}
