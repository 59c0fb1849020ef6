//! TIFF file reader implementation
//!
//! Parses the header and IFD chain of a TIFF or BigTIFF stream and decodes
//! tag values in the file's byte order. Pixel data is not touched here; the
//! raster loader asks for block bytes through `read_block`.

use log::{debug, info, warn};
use std::io::{Cursor, Read, SeekFrom};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// Upper bound on the IFD chain length, guards against offset cycles
const MAX_IFDS: usize = 100;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
    /// Size of the stream being read
    file_size: u64,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
            file_size: u64::MAX,
        }
    }

    /// The byte order handler of the stream last passed to `read`
    pub fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler
            .as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Reads the header and every IFD of a TIFF stream
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;
        self.file_size = validation::get_file_size(reader)?;

        let byte_order = ByteOrder::detect(reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        self.byte_order_handler = Some(byte_order.create_handler());

        let handler = self.handler()?;
        let version = handler.read_u16(reader)?;
        let is_big_tiff = match version {
            header::BIG_TIFF_VERSION => {
                validation::validate_bigtiff_header(reader, handler)?;
                true
            }
            header::TIFF_VERSION => false,
            _ => return Err(TiffError::UnsupportedVersion(version)),
        };

        let first_ifd_offset = if is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };
        debug!("First IFD offset: {}", first_ifd_offset);
        validation::validate_ifd_offset(first_ifd_offset, self.file_size)?;

        self.is_big_tiff = is_big_tiff;
        let mut tiff = TIFF::new(is_big_tiff, byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset)?;

        if tiff.ifds.is_empty() {
            return Err(TiffError::NoImage);
        }

        info!("Read {} IFDs ({})", tiff.ifds.len(), if is_big_tiff { "BigTIFF" } else { "TIFF" });
        Ok(tiff)
    }

    /// Follows the IFD chain; a broken link ends the chain with a warning
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            if ifd_offset >= self.file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, self.file_size);
                break;
            }

            let ifd = match self.read_ifd(reader, ifd_offset, ifds.len()) {
                Ok(ifd) => ifd,
                Err(e) if ifds.is_empty() => return Err(e),
                Err(e) => {
                    warn!("Error reading IFD {}: {}", ifds.len(), e);
                    break;
                }
            };

            // read_ifd leaves the stream right after the last entry
            let handler = self.handler()?;
            let next_ifd_offset = if self.is_big_tiff {
                handler.read_u64(reader)
            } else {
                handler.read_u32(reader).map(u64::from)
            };

            ifds.push(ifd);
            match next_ifd_offset {
                Ok(offset) if offset == 0 || (offset >= 8 && offset < self.file_size) => {
                    ifd_offset = offset;
                }
                Ok(offset) => {
                    warn!("Invalid next IFD offset: {}, stopping IFD chain", offset);
                    break;
                }
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    break;
                }
            }
        }

        Ok(ifds)
    }

    /// Reads one IFD at `offset`
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;
        let handler = self.handler()?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        debug!("IFD #{} at {} has {} entries", number, offset, entry_count);

        let entry_size = if self.is_big_tiff { 20 } else { 12 };
        validation::validate_data_range(offset, entry_count * entry_size, self.file_size)?;

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            ifd.add_entry(self.read_ifd_entry(reader)?);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry and decodes inline scalars
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let mut raw_value = vec![0u8; if self.is_big_tiff { 8 } else { 4 }];
        reader.read_exact(&mut raw_value)?;

        let raw_entry = IFDEntry::with_raw_value(tag, field_type, count, 0, raw_value);
        let mut cursor = Cursor::new(raw_entry.raw_value.as_slice());
        let value_offset = if raw_entry.is_value_inline(self.is_big_tiff) && count == 1 {
            match field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => {
                    raw_entry.raw_value[0] as u64
                }
                field_types::SHORT | field_types::SSHORT => handler.read_u16(&mut cursor)? as u64,
                field_types::LONG | field_types::SLONG | field_types::FLOAT => handler.read_u32(&mut cursor)? as u64,
                _ => handler.read_u64(&mut cursor)?,
            }
        } else if self.is_big_tiff {
            handler.read_u64(&mut cursor)?
        } else {
            handler.read_u32(&mut cursor)? as u64
        };

        Ok(IFDEntry { value_offset, ..raw_entry })
    }

    /// Raw bytes of every value of an entry, inline or not
    fn entry_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> TiffResult<Vec<u8>> {
        let size = entry.data_size();
        if entry.is_value_inline(self.is_big_tiff) {
            return Ok(entry.raw_value[..size as usize].to_vec());
        }
        self.read_block(reader, entry.value_offset, size)
    }

    /// Reads `length` bytes at `offset`, checked against the stream size
    pub fn read_block(&self, reader: &mut dyn SeekableReader, offset: u64, length: u64) -> TiffResult<Vec<u8>> {
        validation::validate_data_range(offset, length, self.file_size)?;
        reader.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; length as usize];
        reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads an integer tag's values as u64
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let bytes = self.entry_bytes(reader, entry)?;
        let handler = self.handler()?;
        let mut cursor = Cursor::new(bytes.as_slice());

        let mut values = Vec::with_capacity(entry.count as usize);
        for _ in 0..entry.count {
            let value = match entry.field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED => {
                    let mut byte = [0u8; 1];
                    cursor.read_exact(&mut byte)?;
                    byte[0] as u64
                }
                field_types::SHORT | field_types::SSHORT => handler.read_u16(&mut cursor)? as u64,
                field_types::LONG | field_types::SLONG => handler.read_u32(&mut cursor)? as u64,
                field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(&mut cursor)?,
                other => return Err(TiffError::UnsupportedFieldType { tag, field_type: other }),
            };
            values.push(value);
        }

        Ok(values)
    }

    /// Reads a DOUBLE tag's values
    pub fn read_tag_doubles(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        if entry.field_type != field_types::DOUBLE {
            return Err(TiffError::UnsupportedFieldType { tag, field_type: entry.field_type });
        }

        let bytes = self.entry_bytes(reader, entry)?;
        let handler = self.handler()?;
        let mut cursor = Cursor::new(bytes.as_slice());

        (0..entry.count)
            .map(|_| handler.read_f64(&mut cursor).map_err(TiffError::from))
            .collect()
    }

    /// Reads an ASCII tag, trailing NULs removed
    pub fn read_tag_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<String> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let mut bytes = self.entry_bytes(reader, entry)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
