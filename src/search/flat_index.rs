//! Exhaustive squared-L2 nearest-neighbor index.
//!
//! File layout (`vectors.bin`): magic `ISQAVEC1`, `u32` dims, `u64` count,
//! then `count * dims` little-endian `f32` values. Row `i` belongs to corpus
//! position `i`.

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{QaError, Result};

const MAGIC: &[u8; 8] = b"ISQAVEC1";

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dims: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    #[must_use]
    pub const fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dims {
            return Err(QaError::IndexCorrupt(format!(
                "vector has {} dims, index expects {}",
                vector.len(),
                self.dims
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return up to `k` `(row, squared_distance)` pairs, nearest first.
    /// Equal distances keep row order.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || query.len() != self.dims || self.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dims)
            .enumerate()
            .map(|(row, stored)| (row, squared_l2(query, stored)))
            .collect();

        // NaN distances (corrupt rows) rank after every real distance.
        let key = |d: f32| if d.is_nan() { f32::INFINITY } else { d };
        scored.sort_by(|a, b| key(a.1).total_cmp(&key(b.1)));
        scored.truncate(k);
        scored
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(std::fs::File::create(&temp_path)?);
            writer.write_all(MAGIC)?;
            let dims = u32::try_from(self.dims)
                .map_err(|_| QaError::IndexCorrupt(format!("dims {} too large", self.dims)))?;
            writer.write_all(&dims.to_le_bytes())?;
            writer.write_all(&(self.len() as u64).to_le_bytes())?;
            for value in &self.data {
                writer.write_all(&value.to_le_bytes())?;
            }
            writer.flush()?;
        }
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QaError::IndexMissing(path.to_path_buf()));
        }
        let mut reader = BufReader::new(std::fs::File::open(path)?);

        let mut magic = [0u8; 8];
        read_exact(&mut reader, &mut magic, path)?;
        if &magic != MAGIC {
            return Err(QaError::IndexCorrupt(format!(
                "{}: bad magic header",
                path.display()
            )));
        }

        let mut dims_bytes = [0u8; 4];
        read_exact(&mut reader, &mut dims_bytes, path)?;
        let dims = u32::from_le_bytes(dims_bytes) as usize;

        let mut count_bytes = [0u8; 8];
        read_exact(&mut reader, &mut count_bytes, path)?;
        let count = usize::try_from(u64::from_le_bytes(count_bytes))
            .map_err(|_| QaError::IndexCorrupt(format!("{}: count overflow", path.display())))?;

        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let expected = count
            .checked_mul(dims)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| QaError::IndexCorrupt(format!("{}: size overflow", path.display())))?;
        if raw.len() != expected {
            return Err(QaError::IndexCorrupt(format!(
                "{}: expected {expected} payload bytes, found {}",
                path.display(),
                raw.len()
            )));
        }

        let data = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { dims, data })
    }
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        QaError::IndexCorrupt(format!("{}: truncated header: {err}", path.display()))
    })
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
