// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use crate::osm::model::{Feature, FeatureType, Relation, RelationMember, Role, Way};
use crate::Point;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader streams osm [Features](Feature) from an XML file, in the order they appear.
///
/// Malformed attributes never abort reading: a node with a missing or out-of-range position
/// is returned as [Point::invalid], while features without an id (and tags, node references
/// or members which can't be parsed) are skipped.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e));
                }
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(&start) {
                            return Some(Ok(Feature::Node(n)));
                        }
                    }
                    b"way" => {
                        if let Some(w) = parse_way(&start) {
                            return Some(Ok(Feature::Way(w)));
                        }
                    }
                    b"relation" => {
                        if let Some(r) = parse_relation(&start) {
                            return Some(Ok(Feature::Relation(r)));
                        }
                    }
                    b"tag" => {
                        if let (Some(tags), Some((k, v))) = (feature_tags(&mut f), parse_tag(&start))
                        {
                            tags.insert(k, v);
                        }
                    }
                    b"nd" => {
                        if let (Some(nodes), Some(ref_)) = (feature_nodes(&mut f), parse_nd(&start))
                        {
                            nodes.push(ref_);
                        }
                    }
                    b"member" => {
                        if let (Some(members), Some(member)) =
                            (feature_members(&mut f), parse_member(&start))
                        {
                            members.push(member);
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => f = parse_node(&start).map(Feature::Node),
                    b"way" => f = parse_way(&start).map(Feature::Way),
                    b"relation" => f = parse_relation(&start).map(Feature::Relation),
                    // "tag", "nd" and "member" must be self-closing
                    _ => {}
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" | b"relation" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        f.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

/// Parses a single attribute value, returning [None] if it's not valid UTF-8
/// or can't be parsed into `T`.
fn parse_value<T: std::str::FromStr>(value: &[u8]) -> Option<T> {
    from_utf8(value).ok()?.parse().ok()
}

fn parse_id(start: &BytesStart<'_>, key: &[u8]) -> Option<i64> {
    let attr = start
        .attributes()
        .filter_map(Result::ok)
        .find(|attr| attr.key.as_ref() == key)?;
    parse_value(&attr.value).filter(|&id| id != 0)
}

fn parse_node(start: &BytesStart<'_>) -> Option<Point> {
    let id = parse_id(start, b"id");
    if id.is_none() {
        log::debug!("skipping node without a valid id");
    }
    let id = id?;

    let mut lat = f64::NAN;
    let mut lon = f64::NAN;
    for attr in start.attributes().filter_map(Result::ok) {
        match attr.key.as_ref() {
            b"lat" => lat = parse_value(&attr.value).unwrap_or(f64::NAN),
            b"lon" => lon = parse_value(&attr.value).unwrap_or(f64::NAN),
            _ => {}
        }
    }

    let p = Point { id, lat, lon };
    Some(if p.is_valid() { p } else { Point::invalid(id) })
}

fn parse_way(start: &BytesStart<'_>) -> Option<Way> {
    Some(Way {
        id: parse_id(start, b"id")?,
        nodes: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_relation(start: &BytesStart<'_>) -> Option<Relation> {
    Some(Relation {
        id: parse_id(start, b"id")?,
        members: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_tag(start: &BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes().filter_map(Result::ok) {
        match attr.key.as_ref() {
            b"k" => k = attr.unescape_value().ok().map(|s| s.into_owned()),
            b"v" => v = attr.unescape_value().ok().map(|s| s.into_owned()),
            _ => {}
        }
    }

    Some((k?, v.unwrap_or_default()))
}

fn parse_nd(start: &BytesStart<'_>) -> Option<i64> {
    parse_id(start, b"ref")
}

fn parse_member(start: &BytesStart<'_>) -> Option<RelationMember> {
    let ref_ = parse_id(start, b"ref")?;
    let mut type_ = None;
    let mut role = Role::Unspecified;

    for attr in start.attributes().filter_map(Result::ok) {
        match attr.key.as_ref() {
            b"type" => type_ = parse_feature_type(&attr.value),
            b"role" => role = from_utf8(&attr.value).map(Role::parse).unwrap_or(role),
            _ => {}
        }
    }

    Some(RelationMember {
        type_: type_?,
        ref_,
        role,
    })
}

fn parse_feature_type(s: &[u8]) -> Option<FeatureType> {
    match s {
        b"node" => Some(FeatureType::Node),
        b"way" => Some(FeatureType::Way),
        b"relation" => Some(FeatureType::Relation),
        _ => None,
    }
}

fn feature_tags(f: &mut Option<Feature>) -> Option<&mut HashMap<String, String>> {
    match f {
        Some(Feature::Way(w)) => Some(&mut w.tags),
        Some(Feature::Relation(r)) => Some(&mut r.tags),
        _ => None,
    }
}

fn feature_nodes(f: &mut Option<Feature>) -> Option<&mut Vec<i64>> {
    match f {
        Some(Feature::Way(w)) => Some(&mut w.nodes),
        _ => None,
    }
}

fn feature_members(f: &mut Option<Feature>) -> Option<&mut Vec<RelationMember>> {
    match f {
        Some(Feature::Relation(r)) => Some(&mut r.members),
        _ => None,
    }
}
