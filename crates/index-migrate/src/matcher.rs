//! Field-wise comparison of index descriptors.

use crate::index::{IndexDescriptor, MetadataField};

/// Fields compared when no explicit set is configured.
pub const DEFAULT_MATCH_FIELDS: [MetadataField; 4] = [
    MetadataField::DataSize,
    MetadataField::Entries,
    MetadataField::Primary,
    MetadataField::Replicas,
];

/// Whether `field` holds the same value on both descriptors.
pub fn field_matches(
    source: &IndexDescriptor,
    target: &IndexDescriptor,
    field: MetadataField,
) -> bool {
    match field {
        MetadataField::Name => source.name == target.name,
        MetadataField::DataSize => source.data_size == target.data_size,
        MetadataField::Entries => source.entries == target.entries,
        MetadataField::FileSize => source.file_size == target.file_size,
        MetadataField::NumberOfPendingTasks => {
            source.number_of_pending_tasks == target.number_of_pending_tasks
        }
        MetadataField::PendingTask => source.pending_task == target.pending_task,
        MetadataField::Primary => source.primary == target.primary,
        MetadataField::Replicas => source.replicas == target.replicas,
    }
}

/// Fields among `fields` whose values differ, in the order given.
pub fn mismatched_fields(
    source: &IndexDescriptor,
    target: &IndexDescriptor,
    fields: &[MetadataField],
) -> Vec<MetadataField> {
    fields
        .iter()
        .copied()
        .filter(|field| !field_matches(source, target, *field))
        .collect()
}

/// Whether every field in `fields` is equal between `source` and `target`.
///
/// Fields outside the set are ignored.
pub fn matching_indexes(
    source: &IndexDescriptor,
    target: &IndexDescriptor,
    fields: &[MetadataField],
) -> bool {
    fields
        .iter()
        .all(|field| field_matches(source, target, *field))
}
