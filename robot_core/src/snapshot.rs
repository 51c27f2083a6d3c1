//! Editor snapshot for deterministic replay testing

use serde::{Deserialize, Serialize};

use crate::line::Validity;

/// Complete editor state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub lines: Vec<String>,
    pub validities: Vec<Validity>,
    pub cursor_line: usize,
    pub cursor_column: usize,
    pub total_size: usize,
    /// Marked line range, if any
    pub mark: Option<(usize, usize)>,
}

impl EditorSnapshot {
    /// Compute a deterministic hash of the snapshot state
    /// This is used for fast comparison in replay tests
    #[cfg(test)]
    pub fn hash(&self) -> u64 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();

        for (line, validity) in self.lines.iter().zip(&self.validities) {
            hasher.update(line.as_bytes());
            hasher.update([b'\n']);
            hasher.update(validity.as_str().as_bytes());
        }

        hasher.update(self.cursor_line.to_le_bytes());
        hasher.update(self.cursor_column.to_le_bytes());
        hasher.update(self.total_size.to_le_bytes());

        match self.mark {
            Some((start, end)) => {
                hasher.update([1]);
                hasher.update(start.to_le_bytes());
                hasher.update(end.to_le_bytes());
            }
            None => hasher.update([0]),
        }

        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }
}
