use crate::protocol::{FrameReader, FrameWriter, ProtocolError};
use crate::session::{ReferenceHandle, ReferenceOrigin, SourceUnit};
use std::io::Cursor;

pub const IMAGE_MAGIC: &[u8; 6] = b"MFIMG\0";
pub const IMAGE_FORMAT_VERSION: i32 = 2;

/// Lays the image out with the same primitives as the wire protocol:
/// magic, version, units (path, symbols, types, partial types, text), then
/// references (path, compatibility-shim flag).
pub(super) fn write_image(
    units: &[SourceUnit],
    references: &[ReferenceHandle],
) -> Result<Vec<u8>, ProtocolError> {
    let mut writer = FrameWriter::new(Vec::new());
    writer.put_raw(IMAGE_MAGIC);
    writer.put_i32(IMAGE_FORMAT_VERSION);

    writer.put_len("unit count", units.len())?;
    for unit in units {
        writer.put_string("unit path", &unit.path.to_string_lossy())?;
        put_list(&mut writer, "unit symbol", unit.symbols.iter())?;
        put_list(&mut writer, "type name", unit.declared_types.iter())?;
        put_list(&mut writer, "partial type name", unit.partial_types.iter())?;
        writer.put_string("unit text", &unit.active_text)?;
    }

    writer.put_len("reference count", references.len())?;
    for reference in references {
        writer.put_string("reference path", &reference.path.to_string_lossy())?;
        writer.put_bool(reference.origin == ReferenceOrigin::CompatibilityShim);
    }
    writer.finish()
}

fn put_list<'a>(
    writer: &mut FrameWriter<Vec<u8>>,
    what: &'static str,
    items: impl ExactSizeIterator<Item = &'a String>,
) -> Result<(), ProtocolError> {
    writer.put_len(what, items.len())?;
    for item in items {
        writer.put_string(what, item)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUnit {
    pub path: String,
    pub symbols: Vec<String>,
    pub types: Vec<String>,
    pub partial_types: Vec<String>,
    pub text_len: usize,
}

/// What a loader can learn from an image without executing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub version: i32,
    pub units: Vec<ImageUnit>,
    pub references: Vec<String>,
    /// The subset of `references` injected as the compatibility shim.
    pub shims: Vec<String>,
}

impl ImageSummary {
    pub fn type_count(&self) -> usize {
        self.units.iter().map(|u| u.types.len()).sum()
    }
}

pub fn read_image(bytes: &[u8]) -> Result<ImageSummary, ProtocolError> {
    if bytes.len() < IMAGE_MAGIC.len() || &bytes[..IMAGE_MAGIC.len()] != IMAGE_MAGIC {
        return Err(ProtocolError::Truncated {
            what: "image magic",
            expected: IMAGE_MAGIC.len(),
            got: bytes.len().min(IMAGE_MAGIC.len()),
        });
    }
    let mut reader = FrameReader::new(Cursor::new(&bytes[IMAGE_MAGIC.len()..]));
    let version = reader.read_i32("image version")?;

    let unit_count = reader.read_len("unit count")?;
    let mut units = Vec::with_capacity(unit_count.min(1024));
    for _ in 0..unit_count {
        let path = reader.read_string("unit path")?;
        let symbols = read_list(&mut reader, "unit symbol")?;
        let types = read_list(&mut reader, "type name")?;
        let partial_types = read_list(&mut reader, "partial type name")?;
        let text_len = reader.read_bytes("unit text")?.len();
        units.push(ImageUnit {
            path,
            symbols,
            types,
            partial_types,
            text_len,
        });
    }

    let reference_count = reader.read_len("reference count")?;
    let mut references = Vec::with_capacity(reference_count.min(1024));
    let mut shims = Vec::new();
    for _ in 0..reference_count {
        let path = reader.read_string("reference path")?;
        if reader.read_bool("reference shim flag")? {
            shims.push(path.clone());
        }
        references.push(path);
    }
    Ok(ImageSummary {
        version,
        units,
        references,
        shims,
    })
}

fn read_list(
    reader: &mut FrameReader<Cursor<&[u8]>>,
    what: &'static str,
) -> Result<Vec<String>, ProtocolError> {
    let count = reader.read_len(what)?;
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(reader.read_string(what)?);
    }
    Ok(items)
}
