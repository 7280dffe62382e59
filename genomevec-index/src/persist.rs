//! # Persisted Index Format
//!
//! ```text
//! ┌──────────┬─────────┬──────┬───────────┬───────────┐
//! │ GNVECIDX │ version │ mode │ dimension │ row count │
//! │  8 bytes │   u32   │  u8  │    u32    │    u64    │
//! └──────────┴─────────┴──────┴───────────┴───────────┘
//! Exact:     count * dimension f32
//! Clustered: nlist u32 | nprobe u32 | nlist * dimension f32 centroids
//!            then per cell: len u64 | len * u64 row ids | len * dimension f32
//! ```
//!
//! All integers and floats are little-endian. Floats are stored bit-for-bit,
//! so a reloaded index returns identical scores.

use std::io::{Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use genomevec_core::error::{Error, Result};

use crate::flat::FlatIndex;
use crate::ivf::{InvertedList, IvfIndex};
use crate::similarity::SimilarityIndex;
use crate::traits::VectorIndex;

const INDEX_MAGIC: &[u8; 8] = b"GNVECIDX";
const INDEX_VERSION: u32 = 1;

const MODE_EXACT: u8 = 0;
const MODE_CLUSTERED: u8 = 1;

/// Serialize an index into `w`
pub fn write_index<W: Write>(index: &SimilarityIndex, w: &mut W) -> Result<()> {
    w.write_all(INDEX_MAGIC)?;
    w.write_u32::<LittleEndian>(INDEX_VERSION)?;

    match index {
        SimilarityIndex::Exact(flat) => {
            w.write_u8(MODE_EXACT)?;
            w.write_u32::<LittleEndian>(flat.dimension() as u32)?;
            w.write_u64::<LittleEndian>(flat.len() as u64)?;
            write_f32s(w, flat.as_slice())?;
        }
        SimilarityIndex::Clustered(ivf) => {
            w.write_u8(MODE_CLUSTERED)?;
            w.write_u32::<LittleEndian>(ivf.dimension() as u32)?;
            w.write_u64::<LittleEndian>(ivf.len() as u64)?;
            w.write_u32::<LittleEndian>(ivf.nlist() as u32)?;
            w.write_u32::<LittleEndian>(ivf.nprobe() as u32)?;
            write_f32s(w, ivf.centroids())?;
            for list in ivf.lists() {
                w.write_u64::<LittleEndian>(list.len() as u64)?;
                for &row in &list.rows {
                    w.write_u64::<LittleEndian>(row as u64)?;
                }
                write_f32s(w, &list.vectors)?;
            }
        }
    }
    Ok(())
}

/// Deserialize an index from an in-memory image of the file
pub fn read_index(bytes: &[u8]) -> Result<SimilarityIndex> {
    let mut cur = Cursor::new(bytes);

    let mut magic = [0u8; 8];
    std::io::Read::read_exact(&mut cur, &mut magic).map_err(truncated)?;
    if &magic != INDEX_MAGIC {
        return Err(corrupt("invalid magic number"));
    }

    let version = cur.read_u32::<LittleEndian>().map_err(truncated)?;
    if version != INDEX_VERSION {
        return Err(corrupt(format!("unsupported version: {}", version)));
    }

    let mode = cur.read_u8().map_err(truncated)?;
    let dimension = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let count = cur.read_u64::<LittleEndian>().map_err(truncated)? as usize;
    if dimension == 0 {
        return Err(corrupt("dimension is zero"));
    }

    let index = match mode {
        MODE_EXACT => {
            let vectors = read_f32s(&mut cur, count, dimension)?;
            SimilarityIndex::Exact(FlatIndex::from_parts(dimension, vectors))
        }
        MODE_CLUSTERED => {
            let nlist = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
            let nprobe = cur.read_u32::<LittleEndian>().map_err(truncated)? as usize;
            if nlist == 0 || nprobe == 0 {
                return Err(corrupt("clustered index with zero nlist or nprobe"));
            }
            let centroids = read_f32s(&mut cur, nlist, dimension)?;

            let mut lists = Vec::with_capacity(nlist);
            for _ in 0..nlist {
                let len = cur.read_u64::<LittleEndian>().map_err(truncated)? as usize;
                ensure_remaining(&cur, len, 8)?;
                let mut rows = Vec::with_capacity(len);
                for _ in 0..len {
                    rows.push(cur.read_u64::<LittleEndian>().map_err(truncated)? as usize);
                }
                let vectors = read_f32s(&mut cur, len, dimension)?;
                lists.push(InvertedList { rows, vectors });
            }

            let ivf = IvfIndex::from_parts(dimension, nprobe, centroids, lists)?;
            if ivf.len() != count {
                return Err(corrupt(format!(
                    "header declares {} rows, cells hold {}",
                    count,
                    ivf.len()
                )));
            }
            SimilarityIndex::Clustered(ivf)
        }
        other => return Err(corrupt(format!("unknown index mode: {}", other))),
    };

    if (cur.position() as usize) != bytes.len() {
        return Err(corrupt("trailing bytes after index body"));
    }
    Ok(index)
}

fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
    for &v in values {
        w.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Read `rows * dimension` floats, checking the length before allocating
fn read_f32s(cur: &mut Cursor<&[u8]>, rows: usize, dimension: usize) -> Result<Vec<f32>> {
    let n = rows
        .checked_mul(dimension)
        .ok_or_else(|| corrupt("vector count overflows"))?;
    ensure_remaining(cur, n, 4)?;
    let mut values = vec![0.0f32; n];
    cur.read_f32_into::<LittleEndian>(&mut values)
        .map_err(truncated)?;
    Ok(values)
}

fn ensure_remaining(cur: &Cursor<&[u8]>, items: usize, width: usize) -> Result<()> {
    let remaining = cur.get_ref().len() as u64 - cur.position();
    match items.checked_mul(width) {
        Some(needed) if needed as u64 <= remaining => Ok(()),
        _ => Err(truncated_msg()),
    }
}

fn corrupt(details: impl Into<String>) -> Error {
    Error::IndexCorruption {
        details: details.into(),
    }
}

fn truncated(_: std::io::Error) -> Error {
    truncated_msg()
}

fn truncated_msg() -> Error {
    corrupt("unexpected end of index file")
}
