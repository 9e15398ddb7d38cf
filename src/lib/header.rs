//! Header edits made by `align-trim`: an @PG record chained onto any existing
//! programs and one @RG record per primer pool.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::program::tag;
use noodles::sam::header::record::value::map::read_group::tag as rg_tag;
use noodles::sam::header::record::value::map::{Program, ReadGroup};
use std::collections::HashSet;

/// Program name written to PN and used as the base @PG ID.
pub const PROGRAM_NAME: &str = "amptrim";

/// ID of the last program in the @PG chain, i.e. the one no other program
/// names as its PP.
#[must_use]
pub fn get_last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let program_map = programs.as_ref();

    let referenced: HashSet<&[u8]> = program_map
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| pp.as_slice())
        .collect();

    program_map
        .keys()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| program_map.keys().next())
        .map(|id| String::from_utf8_lossy(id).to_string())
}

/// `base_id`, or `base_id.N` for the first N that is not already taken.
#[must_use]
pub fn make_unique_program_id(header: &Header, base_id: &str) -> String {
    let programs = header.programs();
    let program_map = programs.as_ref();

    if !program_map.contains_key(base_id.as_bytes()) {
        return base_id.to_string();
    }
    (1..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|candidate| !program_map.contains_key(candidate.as_bytes()))
        .unwrap_or_else(|| base_id.to_string())
}

/// Build an @PG record with PN, VN, CL and an optional PP.
///
/// # Errors
///
/// Returns an error if the program record cannot be built.
pub fn build_program_record(
    version: &str,
    command_line: &str,
    previous_program: Option<&str>,
) -> Result<Map<Program>> {
    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_NAME)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);

    if let Some(pp) = previous_program {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp);
    }

    Ok(builder.build()?)
}

/// Add an @PG record chained to the current last program.
///
/// Returns the header and the ID given to the new program.
///
/// # Errors
///
/// Returns an error if the program record cannot be added to the header.
pub fn add_pg_record(
    mut header: Header,
    version: &str,
    command_line: &str,
) -> Result<(Header, String)> {
    let previous_program = get_last_program_id(&header);
    let unique_id = make_unique_program_id(&header, PROGRAM_NAME);
    let pg_record = build_program_record(version, command_line, previous_program.as_deref())?;

    header.programs_mut().add(BString::from(unique_id.as_str()), pg_record)?;

    Ok((header, unique_id))
}

/// Add an @RG record for each pool, pointing at program `program_id`.
///
/// Existing read groups with the same ID are replaced.
///
/// # Errors
///
/// Returns an error if a read group record cannot be built.
pub fn add_read_groups<S: AsRef<str>>(
    mut header: Header,
    pools: &[S],
    program_id: &str,
) -> Result<Header> {
    for pool in pools {
        let rg = Map::<ReadGroup>::builder().insert(rg_tag::PROGRAM, program_id).build()?;
        header.read_groups_mut().insert(BString::from(pool.as_ref()), rg);
    }
    Ok(header)
}
