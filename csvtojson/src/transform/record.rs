//! Record transformer: one CSV record -> one output object.

use std::collections::BTreeMap;

use crate::config::Settings;

/// Output key -> field value for a single record.
///
/// Ordered so serialization is deterministic (lexicographic keys). Borrows
/// from the headers, settings and current record; nothing outlives the row.
pub type OutputObject<'a> = BTreeMap<&'a str, &'a str>;

/// Build the output object for one record in a single pass over its fields.
///
/// Field `i` is keyed by `headers[i]`, renamed through the mapping when one is
/// set; headers absent from a present mapping are skipped. Injection pairs are
/// merged in once at least one field has been written, overwriting any
/// same-named key; header validation rejects such clashes beforehand.
///
/// Fields beyond `headers.len()` are ignored; the reader rejects such rows
/// before they get here.
pub fn transform_record<'a, I>(headers: &'a [String], settings: &'a Settings, fields: I) -> OutputObject<'a>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = OutputObject::new();
    let mut wrote_field = false;

    for (header, value) in headers.iter().zip(fields) {
        let key = match settings.field_mapping {
            Some(ref mapping) => match mapping.get(header) {
                Some(key) => key.as_str(),
                None => continue,
            },
            None => header.as_str(),
        };

        out.insert(key, value);
        wrote_field = true;
    }

    if wrote_field {
        if let Some(ref injection) = settings.injection {
            for (key, value) in injection {
                out.insert(key.as_str(), value.as_str());
            }
        }
    }

    out
}
