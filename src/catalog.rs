use sgp4::Elements;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{FinderError, FinderResult};

/// One named element set.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub norad_id: String,
    pub elements: Elements,
}

/// Element sets of one object group, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load a three-line TLE file.
    pub fn load<P: AsRef<Path>>(path: P) -> FinderResult<Self> {
        let path = path.as_ref();
        let tle_data = fs::read_to_string(path).map_err(|e| {
            FinderError::ProviderUnavailable(format!(
                "cannot read element sets from {}: {}",
                path.display(),
                e
            ))
        })?;
        let catalog = parse_tle_catalog(&tle_data)?;
        tracing::info!(
            path = %path.display(),
            objects = catalog.len(),
            "loaded element sets"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse name/line1/line2 blocks. Malformed blocks are skipped with a
/// warning. A repeated name takes the later element set but keeps the
/// position where the name first appeared.
pub fn parse_tle_catalog(tle_data: &str) -> FinderResult<Catalog> {
    let lines: Vec<&str> = tle_data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let mut entries: Vec<CatalogEntry> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    let mut i = 0;
    while i + 2 < lines.len() {
        if lines[i + 1].starts_with('1') && lines[i + 2].starts_with('2') {
            let name = lines[i].to_string();

            match Elements::from_tle(
                Some(name.clone()),
                lines[i + 1].as_bytes(),
                lines[i + 2].as_bytes(),
            ) {
                Ok(elements) => {
                    let entry = CatalogEntry {
                        // five-digit catalog number as written in the TLE
                        norad_id: format!("{:05}", elements.norad_id),
                        name: name.clone(),
                        elements,
                    };
                    match index_by_name.get(&name) {
                        Some(&index) => {
                            tracing::warn!(%name, "duplicate object name, using the later element set");
                            entries[index] = entry;
                        }
                        None => {
                            index_by_name.insert(name, entries.len());
                            entries.push(entry);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(%name, error = ?e, "failed to parse TLE");
                }
            }

            i += 3;
        } else {
            i += 1;
        }
    }

    if entries.is_empty() {
        return Err(FinderError::ElementSet(
            "no name/line1/line2 block could be parsed".to_string(),
        ));
    }

    Ok(Catalog { entries })
}

/// Download a group's element sets and store them at `tle_file`.
///
/// The body must parse as a catalog before anything is written, so a failed
/// or truncated download never replaces a good file.
pub fn refresh_group(url: &str, tle_file: &Path) -> FinderResult<usize> {
    tracing::info!(%url, "downloading element sets");
    let body = ureq::get(url).call().map_err(Box::new)?.into_string()?;

    let catalog = parse_tle_catalog(&body)?;

    if let Some(parent) = tle_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(tle_file, body)?;

    tracing::info!(
        path = %tle_file.display(),
        objects = catalog.len(),
        "element sets updated"
    );
    Ok(catalog.len())
}
