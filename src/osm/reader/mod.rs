// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use super::classify::Classifier;
use super::map::Map;

mod xml;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,

    /// [OSM PBF](https://wiki.openstreetmap.org/wiki/PBF_Format), which can be recognized,
    /// but not read.
    Pbf,
}

/// Controls for interpreting OSM data as a [Map].
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    /// How OSM features should be classified into areas and roads.
    pub classifier: &'a Classifier<'a>,

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter nodes by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite.
    pub bbox: [f64; 4],

    /// Assemble areas and build the graph on two threads at the same time.
    pub parallel: bool,
}

impl Default for Options<'static> {
    fn default() -> Self {
        Self {
            classifier: &super::DEFAULT_CLASSIFIER,
            file_format: FileFormat::Unknown,
            bbox: [0.0; 4],
            parallel: true,
        }
    }
}

/// Error which prevented a [Map] from being loaded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(&'static str),
}

/// Guesses the format of the data by looking at its first bytes, without consuming them.
/// Returns [FileFormat::Unknown] if the content is not recognized.
fn detect_format<R: BufRead>(reader: &mut R) -> io::Result<FileFormat> {
    let head = reader.fill_buf()?;
    let format = if head.starts_with(&[0x1F, 0x8B]) {
        FileFormat::XmlGz
    } else if head.starts_with(b"BZh") {
        FileFormat::XmlBz2
    } else if head.starts_with(b"<") || head.starts_with(b"\xEF\xBB\xBF<") {
        FileFormat::Xml
    } else if head.len() >= 4 && head[4..].starts_with(b"\x0A\x09OSMHeader") {
        // PBF files start with a big-endian length of the first BlobHeader,
        // followed by its protobuf-encoded "type" field
        FileFormat::Pbf
    } else {
        FileFormat::Unknown
    };
    Ok(format)
}

/// Parse OSM features from a reader into a [Map] as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn load_from_io<R: io::Read>(options: &Options, reader: R) -> Result<Map, Error> {
    let mut b = io::BufReader::new(reader);
    let format = match options.file_format {
        FileFormat::Unknown => detect_format(&mut b)?,
        format => format,
    };
    log::debug!("reading {format:?} data");

    match format {
        FileFormat::Unknown => Err(Error::UnsupportedFormat("unrecognized content")),

        FileFormat::Xml => Ok(Map::from_features(xml::Reader::from_io(b), options)?),

        FileFormat::XmlGz => {
            let d = flate2::bufread::MultiGzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            Ok(Map::from_features(r, options)?)
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::bufread::MultiBzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            Ok(Map::from_features(r, options)?)
        }

        FileFormat::Pbf => Err(Error::UnsupportedFormat(".osm.pbf files are not supported")),
    }
}

/// Parse OSM features from a file at the provided path into a [Map] as per the provided [Options].
pub fn load_from_file<P: AsRef<Path>>(options: &Options, path: P) -> Result<Map, Error> {
    let path = path.as_ref();
    log::info!("loading {}", path.display());
    let f = File::open(path)?;
    load_from_io(options, f)
}

/// Parse OSM features from a static buffer into a [Map] as per the provided [Options].
pub fn load_from_buffer(options: &Options, mut data: &[u8]) -> Result<Map, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => detect_format(&mut data)?,
        format => format,
    };

    if format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        Ok(Map::from_features(xml::Reader::from_buffer(data), options)?)
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let options = Options {
            file_format: format,
            ..*options
        };
        load_from_io(&options, io::Cursor::new(data))
    }
}
