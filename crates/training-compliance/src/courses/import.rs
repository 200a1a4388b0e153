use std::collections::BTreeSet;
use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::domain::{Company, User, UserId, UserRole};

/// Result of a roster CSV ingestion: parsed standard-role users, deduplicated
/// by id keeping the first occurrence, plus how many rows were unusable.
#[derive(Debug)]
pub struct RosterImport {
    pub users: Vec<User>,
    pub skipped_rows: usize,
}

/// Parse a roster export with `name`, `id`, `part`, `group` columns.
///
/// Rows missing a name or id are counted as skipped rather than failing the
/// whole file. The employment category is derived from the id shape: 8-digit
/// ids are staff badges, anything else is vendor personnel.
pub fn parse_roster<R: Read>(reader: R) -> Result<RosterImport, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut users = Vec::new();
    let mut seen_ids: BTreeSet<UserId> = BTreeSet::new();
    let mut skipped_rows = 0;

    for record in csv_reader.deserialize::<RosterRow>() {
        let row = record?;
        let (name, id) = match (row.name, row.id) {
            (Some(name), Some(id)) => (name, id),
            _ => {
                skipped_rows += 1;
                continue;
            }
        };

        let user_id = UserId(id);
        if !seen_ids.insert(user_id.clone()) {
            continue;
        }

        users.push(User {
            company: company_for_id(&user_id),
            id: user_id,
            name,
            part: row.part.unwrap_or_else(|| "N/A".to_string()),
            group: row.group.unwrap_or_else(|| "N/A".to_string()),
            role: UserRole::Standard,
        });
    }

    Ok(RosterImport {
        users,
        skipped_rows,
    })
}

/// 8-digit ids are staff badges; every other shape belongs to a vendor.
pub fn company_for_id(id: &UserId) -> Company {
    let raw = id.as_str();
    if raw.len() == 8 && raw.bytes().all(|byte| byte.is_ascii_digit()) {
        Company::Staff
    } else {
        Company::Vendor
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    part: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    group: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Error raised when the roster file itself cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster csv: {0}")]
    Csv(#[from] csv::Error),
}
