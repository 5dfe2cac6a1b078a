//! Identifier deriver: canonical ids, stable extension ids and existence flags

use super::existence::{DuplicateTracker, ExtensionIndex};
use crate::align::RenameMap;
use crate::config::IdentifierConfig;
use crate::error::{Error, Result};
use crate::transform::bool_to_int32;
use crate::types::{Provider, RecordType};
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use md5::{Digest, Md5};
use std::sync::Arc;

/// Stable identifier of an ordered field tuple: MD5 of the fields joined by
/// `separator`, as 32 lowercase hex characters. Pass `""` for null fields.
pub fn stable_identifier(fields: &[&str], separator: &str) -> String {
    let mut hasher = Md5::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(separator.as_bytes());
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Values of a column as display strings; nulls stay `None`
pub fn value_strings(array: &ArrayRef) -> Result<Vec<Option<String>>> {
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
    Ok((0..array.len())
        .map(|i| array.is_valid(i).then(|| formatter.value(i).to_string()))
        .collect())
}

/// Find a raw provider field in a (possibly renamed) schema
///
/// Tries the raw name, then its renamed form, then both case-insensitively.
pub fn resolve_column(
    schema: &Schema,
    renames: &RenameMap,
    provider: Provider,
    raw: &str,
) -> Option<usize> {
    let renamed = renames.apply(provider, raw);
    schema
        .index_of(raw)
        .or_else(|_| schema.index_of(renamed))
        .ok()
        .or_else(|| {
            schema.fields().iter().position(|f| {
                f.name().eq_ignore_ascii_case(raw) || f.name().eq_ignore_ascii_case(renamed)
            })
        })
}

/// Stamps identifiers onto one provider's batches of one record type
///
/// Occurrence batches get their native id renamed to the canonical id
/// column plus one 0/1 flag per attached extension index. Extension batches
/// get a hashed stable id and their parent pointer renamed. Both get a
/// provenance column.
#[derive(Debug)]
pub struct IdentifierDeriver {
    config: IdentifierConfig,
    provider: Provider,
    record_type: RecordType,
    renames: Arc<RenameMap>,
    indexes: Vec<Arc<ExtensionIndex>>,
    tracker: DuplicateTracker,
}

impl IdentifierDeriver {
    pub fn new(
        config: IdentifierConfig,
        provider: Provider,
        record_type: RecordType,
        renames: Arc<RenameMap>,
    ) -> Self {
        Self {
            config,
            provider,
            record_type,
            renames,
            indexes: Vec::new(),
            tracker: DuplicateTracker::new(),
        }
    }

    /// Attach an extension index; occurrence batches then get its flag column
    #[must_use]
    pub fn with_extension_index(mut self, index: Arc<ExtensionIndex>) -> Self {
        self.indexes.push(index);
        self
    }

    /// Repeated native occurrence ids seen so far
    pub fn duplicate_ids(&self) -> u64 {
        self.tracker.duplicates()
    }

    pub fn derive(&mut self, batch: &RecordBatch) -> Result<RecordBatch> {
        self.derive_from(batch, batch)
    }

    /// Stamp identifiers onto `batch`, reading id and hash values from `raw`
    ///
    /// `raw` is the same rows as read from the source, before any renaming or
    /// coercion, so stable ids do not depend on transform settings.
    pub fn derive_from(&mut self, raw: &RecordBatch, batch: &RecordBatch) -> Result<RecordBatch> {
        if raw.num_rows() != batch.num_rows() {
            return Err(Error::validation(format!(
                "Source batch has {} rows but the transformed batch has {}",
                raw.num_rows(),
                batch.num_rows()
            )));
        }
        let mut fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

        if self.record_type.is_extension() {
            self.derive_extension(raw, batch, &mut fields, &mut columns)?;
        } else {
            self.derive_occurrence(raw, batch, &mut fields, &mut columns)?;
        }

        fields.push(Field::new(
            &self.config.data_source_column,
            arrow::datatypes::DataType::Utf8,
            false,
        ));
        columns.push(Arc::new(StringArray::from(vec![
            self.provider.as_str();
            batch.num_rows()
        ])));

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }

    fn required_column(&self, schema: &Schema, raw: &str) -> Result<usize> {
        resolve_column(schema, &self.renames, self.provider, raw).ok_or_else(|| {
            Error::missing_column(
                raw,
                format!("{} {} batch", self.provider, self.record_type),
            )
        })
    }

    fn derive_occurrence(
        &mut self,
        raw: &RecordBatch,
        batch: &RecordBatch,
        fields: &mut Vec<Field>,
        columns: &mut Vec<ArrayRef>,
    ) -> Result<()> {
        let native_id = &self.config.for_provider(self.provider).occurrence_id;
        let idx = self.required_column(batch.schema_ref(), native_id)?;
        fields[idx] = fields[idx]
            .clone()
            .with_name(self.config.source_id_column.clone());

        let raw_idx = self.required_column(raw.schema_ref(), native_id)?;
        let ids = value_strings(raw.column(raw_idx))?;
        let repeated = self.tracker.observe(&ids);
        if repeated > 0 {
            tracing::debug!("{} repeated occurrence ids in batch", repeated);
        }

        for index in &self.indexes {
            let Some(name) = self.config.flag_column(index.record_type()) else {
                continue;
            };
            // One flag per id; repeated ids stay repeated rows
            let flags: ArrayRef = Arc::new(index.flags(&ids));
            let flags = bool_to_int32(&flags)?;
            fields.push(Field::new(name, flags.data_type().clone(), false));
            columns.push(flags);
        }
        Ok(())
    }

    fn derive_extension(
        &self,
        raw: &RecordBatch,
        batch: &RecordBatch,
        fields: &mut Vec<Field>,
        columns: &mut Vec<ArrayRef>,
    ) -> Result<()> {
        let ext = self
            .config
            .for_provider(self.provider)
            .extension(self.record_type)
            .ok_or_else(|| Error::config(format!("No identifier fields for {}", self.record_type)))?;

        let parent = self.required_column(batch.schema_ref(), &ext.parent_id)?;

        // Missing hash fields hash as empty strings, like nulls
        let mut hash_inputs: Vec<Vec<Option<String>>> = Vec::with_capacity(ext.hash_fields.len());
        for field in &ext.hash_fields {
            match resolve_column(raw.schema_ref(), &self.renames, self.provider, field) {
                Some(idx) => hash_inputs.push(value_strings(raw.column(idx))?),
                None => {
                    tracing::debug!(
                        "{} {} batch has no '{}'; hashing it as empty",
                        self.provider,
                        self.record_type,
                        field
                    );
                    hash_inputs.push(vec![None; raw.num_rows()]);
                }
            }
        }

        let ids: StringArray = (0..batch.num_rows())
            .map(|row| {
                let values: Vec<&str> = hash_inputs
                    .iter()
                    .map(|column| column[row].as_deref().unwrap_or(""))
                    .collect();
                Some(stable_identifier(&values, &self.config.separator))
            })
            .collect();

        fields[parent] = fields[parent]
            .clone()
            .with_name(self.config.parent_id_column.clone());

        fields.insert(
            0,
            Field::new(&self.config.source_id_column, arrow::datatypes::DataType::Utf8, false),
        );
        columns.insert(0, Arc::new(ids));
        Ok(())
    }
}
