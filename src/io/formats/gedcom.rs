//! Genealogy text export: a GEDCOM 5.5.1 lineage-linked subset.
//!
//! # Records
//!
//! | Record | Contents |
//! |--------|----------|
//! | `HEAD` | source, export date, GEDCOM version and form, charset |
//! | `INDI` | names, sex, birth, death, events, notes, photo, family links |
//! | `FAM` | partners (`HUSB`/`WIFE`) and children (`CHIL`) |
//! | `TRLR` | end of file |
//!
//! Xrefs are numbered by snapshot order: `@I1@` is the first person and
//! `@F1@` the first family. A family is emitted per spouse pair, holding every
//! child of either partner. Parents with no spouse edge get a single-parent
//! family so no parent link is lost.

use crate::Result;
use crate::io::formats::ExportFormat;
use crate::io::traits::{SnapshotEncoder, write_failed};
use crate::io::validation::validate_snapshot;
use crate::models::{Event, Gender, GraphSnapshot, Person, PersonId, RelationshipType};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use tracing::debug;

/// GEDCOM version declared in the header.
pub const GEDCOM_VERSION: &str = "5.5.1";

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// GEDCOM encoder.
#[derive(Debug, Clone, Copy)]
pub struct GedcomEncoder {
    exported_at: DateTime<Utc>,
}

impl GedcomEncoder {
    /// Creates an encoder that stamps `exported_at` into the header.
    #[must_use]
    pub const fn new(exported_at: DateTime<Utc>) -> Self {
        Self { exported_at }
    }
}

impl SnapshotEncoder for GedcomEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::GenealogyText
    }

    fn encode(&self, snapshot: &GraphSnapshot, out: &mut dyn Write) -> Result<()> {
        let warnings = validate_snapshot(snapshot)?;
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "Encoding snapshot with warnings");
        }

        let families = Families::collect(snapshot);
        let xrefs: HashMap<&PersonId, String> = snapshot
            .people
            .iter()
            .enumerate()
            .map(|(i, p)| (&p.id, format!("@I{}@", i + 1)))
            .collect();

        let mut w = LineWriter { out };
        self.write_header(&mut w)?;
        for person in &snapshot.people {
            write_individual(&mut w, person, &xrefs, &families, snapshot)?;
        }
        for (i, family) in families.list.iter().enumerate() {
            w.record(&family_xref(i), "FAM")?;
            if let Some(husband) = family.husband {
                w.pointer(1, "HUSB", &xrefs[husband])?;
            }
            if let Some(wife) = family.wife {
                w.pointer(1, "WIFE", &xrefs[wife])?;
            }
            for child in &family.children {
                w.pointer(1, "CHIL", &xrefs[*child])?;
            }
        }
        w.line(0, "TRLR", "")?;
        Ok(())
    }
}

impl GedcomEncoder {
    fn write_header(&self, w: &mut LineWriter<'_>) -> Result<()> {
        w.line(0, "HEAD", "")?;
        w.line(1, "SOUR", "FAMGRAPH")?;
        w.line(2, "VERS", env!("CARGO_PKG_VERSION"))?;
        w.line(2, "NAME", "famgraph")?;
        w.line(1, "DATE", &format_date(&self.exported_at.format("%Y-%m-%d").to_string()))?;
        w.line(1, "GEDC", "")?;
        w.line(2, "VERS", GEDCOM_VERSION)?;
        w.line(2, "FORM", "LINEAGE-LINKED")?;
        w.line(1, "CHAR", "UTF-8")
    }
}

fn write_individual(
    w: &mut LineWriter<'_>,
    person: &Person,
    xrefs: &HashMap<&PersonId, String>,
    families: &Families<'_>,
    snapshot: &GraphSnapshot,
) -> Result<()> {
    let data = &person.data;
    let given = person.given_names();

    w.record(&xrefs[&person.id], "INDI")?;
    w.line(1, "NAME", &format!("{given} /{}/", data.last_name))?;
    w.line(2, "GIVN", &given)?;
    if !data.last_name.is_empty() {
        w.line(2, "SURN", &data.last_name)?;
    }
    if let Some(maiden) = &data.maiden_name {
        w.line(1, "NAME", &format!("{given} /{maiden}/"))?;
        w.line(2, "TYPE", "birth")?;
        w.line(2, "SURN", maiden)?;
    }
    w.line(1, "SEX", sex_code(data.gender))?;

    if data.birth_date.is_some() || data.birth_place.is_some() {
        w.line(1, "BIRT", "")?;
        write_date_place(w, data.birth_date.as_deref(), data.birth_place.as_deref())?;
    }
    if data.death_date.is_some() || data.death_place.is_some() {
        w.line(1, "DEAT", "")?;
        write_date_place(w, data.death_date.as_deref(), data.death_place.as_deref())?;
    } else if !data.is_living {
        w.line(1, "DEAT", "Y")?;
    }

    for event in owned_events(snapshot, &person.id) {
        write_event(w, event)?;
    }

    if let Some(biography) = &data.biography {
        write_note(w, 1, biography)?;
    }
    if let Some(photo) = &data.photo_url {
        w.line(1, "OBJE", "")?;
        w.line(2, "FILE", photo)?;
    }

    for (i, family) in families.list.iter().enumerate() {
        if family.husband == Some(&person.id) || family.wife == Some(&person.id) {
            w.pointer(1, "FAMS", &family_xref(i))?;
        }
    }
    for (i, family) in families.list.iter().enumerate() {
        if family.children.contains(&&person.id) {
            w.pointer(1, "FAMC", &family_xref(i))?;
        }
    }
    Ok(())
}

fn write_date_place(w: &mut LineWriter<'_>, date: Option<&str>, place: Option<&str>) -> Result<()> {
    if let Some(date) = date {
        w.line(2, "DATE", &format_date(date))?;
    }
    if let Some(place) = place {
        w.line(2, "PLAC", place)?;
    }
    Ok(())
}

fn write_event(w: &mut LineWriter<'_>, event: &Event) -> Result<()> {
    let data = &event.data;
    w.line(1, "EVEN", &data.title)?;
    w.line(2, "TYPE", &data.event_type)?;
    if let Some(date) = &data.date {
        w.line(2, "DATE", &format_date(date))?;
    }
    if let Some(description) = &data.description {
        write_note(w, 2, description)?;
    }
    Ok(())
}

fn write_note(w: &mut LineWriter<'_>, level: u8, text: &str) -> Result<()> {
    let mut lines = text.lines();
    w.line(level, "NOTE", lines.next().unwrap_or_default())?;
    for line in lines {
        w.line(level + 1, "CONT", line)?;
    }
    Ok(())
}

fn owned_events<'a>(
    snapshot: &'a GraphSnapshot,
    person: &'a PersonId,
) -> impl Iterator<Item = &'a Event> {
    snapshot
        .events
        .iter()
        .filter(move |e| e.data.person_id.as_ref() == Some(person))
}

fn family_xref(index: usize) -> String {
    format!("@F{}@", index + 1)
}

const fn sex_code(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "M",
        Gender::Female => "F",
        Gender::Other => "U",
    }
}

/// Converts an ISO date to GEDCOM form.
///
/// `YYYY-MM-DD` becomes `DD MON YYYY` and `YYYY-MM` becomes `MON YYYY`.
/// Anything else, including impossible calendar dates, is returned as-is.
#[must_use]
pub fn format_date(date: &str) -> String {
    let trimmed = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return parsed.format("%d %b %Y").to_string().to_uppercase();
    }
    if let Some((year, month)) = trimmed.split_once('-') {
        let year_ok = year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit());
        let month = month.parse::<usize>().ok().filter(|m| (1..=12).contains(m));
        if let Some(month) = month.filter(|_| year_ok) {
            return format!("{} {year}", MONTHS[month - 1]);
        }
    }
    trimmed.to_string()
}

struct LineWriter<'w> {
    out: &'w mut dyn Write,
}

impl LineWriter<'_> {
    fn line(&mut self, level: u8, tag: &str, value: &str) -> Result<()> {
        let value = sanitize(value);
        let result = if value.is_empty() {
            writeln!(self.out, "{level} {tag}")
        } else {
            writeln!(self.out, "{level} {tag} {value}")
        };
        result.map_err(|e| write_failed("write_gedcom", e))
    }

    fn pointer(&mut self, level: u8, tag: &str, xref: &str) -> Result<()> {
        writeln!(self.out, "{level} {tag} {xref}").map_err(|e| write_failed("write_gedcom", e))
    }

    fn record(&mut self, xref: &str, tag: &str) -> Result<()> {
        writeln!(self.out, "0 {xref} {tag}").map_err(|e| write_failed("write_gedcom", e))
    }
}

// Line values must stay on one line, and a literal `@` is doubled so it
// cannot be read back as a cross-reference.
fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        match c {
            '\n' | '\r' => out.push(' '),
            '@' => out.push_str("@@"),
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

#[derive(Debug, Default)]
struct Family<'a> {
    husband: Option<&'a PersonId>,
    wife: Option<&'a PersonId>,
    children: Vec<&'a PersonId>,
}

struct Families<'a> {
    list: Vec<Family<'a>>,
}

impl<'a> Families<'a> {
    fn collect(snapshot: &'a GraphSnapshot) -> Self {
        let people: HashMap<&PersonId, (usize, Gender)> = snapshot
            .people
            .iter()
            .enumerate()
            .map(|(i, p)| (&p.id, (i, p.data.gender)))
            .collect();

        let mut children_of: HashMap<&PersonId, Vec<&PersonId>> = HashMap::new();
        let mut parent_order: Vec<&PersonId> = Vec::new();
        for rel in &snapshot.relationships {
            if rel.relationship_type != RelationshipType::ParentChild
                || rel.person_a == rel.person_b
            {
                continue;
            }
            let kids = children_of.entry(&rel.person_a).or_default();
            if kids.is_empty() {
                parent_order.push(&rel.person_a);
            }
            if !kids.contains(&&rel.person_b) {
                kids.push(&rel.person_b);
            }
        }

        let mut list = Vec::new();
        let mut pairs = HashSet::new();
        let mut partnered = HashSet::new();
        for rel in &snapshot.relationships {
            if rel.relationship_type != RelationshipType::Spouse || rel.person_a == rel.person_b {
                continue;
            }
            let (Some(&(ia, ga)), Some(&(ib, gb))) =
                (people.get(&rel.person_a), people.get(&rel.person_b))
            else {
                continue;
            };
            let (first, second, first_gender, second_gender) = if ia <= ib {
                (&rel.person_a, &rel.person_b, ga, gb)
            } else {
                (&rel.person_b, &rel.person_a, gb, ga)
            };
            if !pairs.insert((first, second)) {
                continue;
            }
            partnered.insert(first);
            partnered.insert(second);

            let (husband, wife) =
                if first_gender == Gender::Female && second_gender != Gender::Female {
                    (second, first)
                } else {
                    (first, second)
                };

            let mut children: Vec<&PersonId> = Vec::new();
            for parent in [first, second] {
                for &child in children_of.get(parent).into_iter().flatten() {
                    if !children.contains(&child) {
                        children.push(child);
                    }
                }
            }
            list.push(Family {
                husband: Some(husband),
                wife: Some(wife),
                children,
            });
        }

        for parent in parent_order {
            if partnered.contains(parent) {
                continue;
            }
            let Some(&(_, gender)) = people.get(parent) else {
                continue;
            };
            let mut family = Family {
                children: children_of.get(parent).cloned().unwrap_or_default(),
                ..Family::default()
            };
            if gender == Gender::Female {
                family.wife = Some(parent);
            } else {
                family.husband = Some(parent);
            }
            list.push(family);
        }

        Self { list }
    }
}
