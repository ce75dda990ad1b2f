//! Vertex and index buffers, plus their little-endian stream format
//!
//! Stream layout: a `u16` element count followed by that many records, either
//! 5 x `f32` (x, y, z, u, v) per vertex or one `u16` per index. No header, no
//! padding.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::error::{Error, Result};
use super::types::{Vertex, VertexData};

fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_f32<R: Read>(r: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn element_count(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len).map_err(|_| {
        Error::invalid_argument(format!("{} {}s exceed the stream limit of {}", len, what, u16::MAX))
    })
}

#[derive(Debug, Clone, Default)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents; storage is only reallocated when the count changes
    pub fn data(&mut self, data: &[VertexData]) {
        if self.vertices.len() != data.len() {
            self.vertices = vec![Vertex::default(); data.len()];
        }
        for (vertex, src) in self.vertices.iter_mut().zip(data) {
            *vertex = Vertex::from_data(src);
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Read a whole stream; the buffer is left untouched if it is truncated
    pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<()> {
        let count = read_u16(r)? as usize;
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            data.push(VertexData {
                x: read_f32(r)?,
                y: read_f32(r)?,
                z: read_f32(r)?,
                u: read_f32(r)?,
                v: read_f32(r)?,
            });
        }
        self.data(&data);
        Ok(())
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let count = element_count(self.vertices.len(), "vertex")?;
        w.write_all(&count.to_le_bytes())?;
        for vertex in &self.vertices {
            let d = vertex.to_data();
            for f in [d.x, d.y, d.z, d.u, d.v] {
                w.write_all(&f.to_le_bytes())?;
            }
        }
        Ok(())
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.read_from(&mut BufReader::new(file))?;
        log::debug!("loaded {} vertices from {}", self.len(), path.as_ref().display());
        Ok(())
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuffer {
    indices: Vec<u16>,
}

impl IndexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&mut self, data: &[u16]) {
        if self.indices.len() != data.len() {
            self.indices = vec![0; data.len()];
        }
        self.indices.copy_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<()> {
        let count = read_u16(r)? as usize;
        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            data.push(read_u16(r)?);
        }
        self.data(&data);
        Ok(())
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let count = element_count(self.indices.len(), "index")?;
        w.write_all(&count.to_le_bytes())?;
        for index in &self.indices {
            w.write_all(&index.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.read_from(&mut BufReader::new(file))?;
        log::debug!("loaded {} indices from {}", self.len(), path.as_ref().display());
        Ok(())
    }

    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
