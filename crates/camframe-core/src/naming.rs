use time::OffsetDateTime;

use crate::protocol::category::Category;

/// File name for a saved frame: `<YYYYmmdd_HHMMSS>_<category>_<sequence>.<ext>`.
///
/// The category part uses the same mapping as display, in its file-safe form.
///
/// # Examples
/// ```
/// use camframe_core::{Category, artifact_file_name};
/// use time::OffsetDateTime;
///
/// let taken = OffsetDateTime::from_unix_timestamp(1_709_967_902)?;
/// let name = artifact_file_name(taken, Category::Infrared, 12, "jpg");
/// assert_eq!(name, "20240309_070502_Infrared_Light_12.jpg");
/// # Ok::<(), time::error::ComponentRange>(())
/// ```
pub fn artifact_file_name(
    timestamp: OffsetDateTime,
    category: Category,
    sequence: u64,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{sequence}.{extension}",
        compact_timestamp(timestamp),
        category.file_name()
    )
}

/// `YYYYmmdd_HHMMSS` in the timestamp's own offset.
pub fn compact_timestamp(timestamp: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        timestamp.year(),
        u8::from(timestamp.month()),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
}
