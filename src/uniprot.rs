//! UniProtKB XML entry-list decoding.
//!
//! Element names are matched by local name so both namespaced
//! (`xmlns="http://uniprot.org/uniprot"`) and bare documents decode.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::domain::RawProtein;
use crate::error::KiraError;

pub const DEFAULT_URL: &str = "https://ftp.uniprot.org/pub/databases/uniprot/current_release/knowledgebase/complete/uniprot_sprot.xml.gz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Accession,
    FullName,
    GeneName,
    CommonName,
}

#[derive(Debug, Default)]
struct EntryBuilder {
    accession: Option<String>,
    full_name: Option<String>,
    gene_name: Option<String>,
    common_name: Option<String>,
    string_ref: Option<String>,
    opentargets_ref: Option<String>,
    sequence_length: Option<u64>,
    sequence_mass: Option<u64>,
}

impl EntryBuilder {
    fn set(&mut self, capture: Capture, text: String) {
        let slot = match capture {
            Capture::Accession => &mut self.accession,
            Capture::FullName => &mut self.full_name,
            Capture::GeneName => &mut self.gene_name,
            Capture::CommonName => &mut self.common_name,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn has(&self, capture: Capture) -> bool {
        match capture {
            Capture::Accession => self.accession.is_some(),
            Capture::FullName => self.full_name.is_some(),
            Capture::GeneName => self.gene_name.is_some(),
            Capture::CommonName => self.common_name.is_some(),
        }
    }

    /// Optional descriptive fields fall back to `""` and absent sequence
    /// attributes to `0`; only the accession can be missing.
    fn finish(self) -> RawProtein {
        RawProtein {
            primary_accession: self.accession,
            recommended_protein_name: Some(self.full_name.unwrap_or_default()),
            primary_gene_name: Some(self.gene_name.unwrap_or_default()),
            species_common_name: Some(self.common_name.unwrap_or_default()),
            string_db_reference: Some(self.string_ref.unwrap_or_default()),
            opentargets_db_reference: Some(self.opentargets_ref.unwrap_or_default()),
            sequence_length: Some(self.sequence_length.unwrap_or_default()),
            sequence_mass: Some(self.sequence_mass.unwrap_or_default()),
        }
    }

    /// Handles the attribute-only children of `<entry>`.
    fn direct_child(&mut self, element: &BytesStart<'_>) -> Result<(), KiraError> {
        match local_name(element).as_str() {
            "dbReference" => {
                let kind = attribute(element, "type")?;
                let slot = match kind.as_deref() {
                    Some("STRING") => &mut self.string_ref,
                    Some("OpenTargets") => &mut self.opentargets_ref,
                    _ => return Ok(()),
                };
                if slot.is_none() {
                    *slot = attribute(element, "id")?;
                }
            }
            "sequence" => {
                self.sequence_length = numeric_attribute(element, "length")?;
                self.sequence_mass = numeric_attribute(element, "mass")?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Decodes up to `limit` entries from a UniProtKB XML document.
pub fn decode_entries(xml: &[u8], limit: Option<usize>) -> Result<Vec<RawProtein>, KiraError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut entry: Option<(usize, EntryBuilder)> = None;
    let mut capture: Option<Capture> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    if limit == Some(0) {
        return Ok(records);
    }

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| KiraError::UniprotXml(err.to_string()))?;
        match event {
            Event::Start(element) => {
                let name = local_name(&element);
                if let Some((depth, builder)) = entry.as_mut() {
                    let within = &path[*depth + 1..];
                    if within.is_empty() {
                        builder.direct_child(&element)?;
                    }
                    capture = wanted_text(within, &name, &element, builder)?;
                    text.clear();
                } else if name == "entry" {
                    entry = Some((path.len(), EntryBuilder::default()));
                }
                path.push(name);
            }
            Event::Empty(element) => {
                if let Some((depth, builder)) = entry.as_mut() {
                    if path.len() == *depth + 1 {
                        builder.direct_child(&element)?;
                    }
                }
            }
            Event::Text(content) => {
                if capture.is_some() {
                    let value = content
                        .unescape()
                        .map_err(|err| KiraError::UniprotXml(err.to_string()))?;
                    text.push_str(&value);
                }
            }
            Event::CData(content) => {
                if capture.is_some() {
                    text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::End(_) => {
                path.pop();
                let mut closed = false;
                if let Some((depth, builder)) = entry.as_mut() {
                    if let Some(target) = capture.take() {
                        builder.set(target, std::mem::take(&mut text));
                    }
                    closed = path.len() == *depth;
                }
                if closed {
                    if let Some((_, builder)) = entry.take() {
                        records.push(builder.finish());
                    }
                    if limit.is_some_and(|limit| records.len() >= limit) {
                        break;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if entry.is_some() {
        return Err(KiraError::UniprotXml(
            "document ended inside an <entry>".to_string(),
        ));
    }
    Ok(records)
}

/// Which text field, if any, the element opening at `within/name` carries.
fn wanted_text(
    within: &[String],
    name: &str,
    element: &BytesStart<'_>,
    builder: &EntryBuilder,
) -> Result<Option<Capture>, KiraError> {
    let within = within.iter().map(String::as_str).collect::<Vec<_>>();
    let capture = match (within.as_slice(), name) {
        ([], "accession") => Capture::Accession,
        (["protein", "recommendedName"], "fullName") => Capture::FullName,
        (["gene"], "name") => {
            if attribute(element, "type")?.as_deref() != Some("primary") {
                return Ok(None);
            }
            Capture::GeneName
        }
        (["organism"], "name") => {
            if attribute(element, "type")?.as_deref() != Some("common") {
                return Ok(None);
            }
            Capture::CommonName
        }
        _ => return Ok(None),
    };
    Ok((!builder.has(capture)).then_some(capture))
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Result<Option<String>, KiraError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| KiraError::UniprotXml(err.to_string()))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| KiraError::UniprotXml(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn numeric_attribute(element: &BytesStart<'_>, key: &str) -> Result<Option<u64>, KiraError> {
    match attribute(element, key)? {
        Some(value) => value.trim().parse::<u64>().map(Some).map_err(|_| {
            KiraError::UniprotXml(format!("sequence {key} is not a number: {value}"))
        }),
        None => Ok(None),
    }
}
