use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Acquisition mode announced in the frame header.
///
/// The firmware numbers its lighting modes 1..=3; any other value is kept
/// as `Unknown` so that frames from newer firmware still decode.
///
/// # Examples
/// ```
/// use camframe_core::Category;
///
/// assert_eq!(Category::from_code(3), Category::Infrared);
/// assert_eq!(Category::from_code(9).to_string(), "unknown mode 9");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Category {
    NoLight,
    VisibleLight,
    Infrared,
    Unknown(u32),
}

impl Category {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Category::NoLight,
            2 => Category::VisibleLight,
            3 => Category::Infrared,
            other => Category::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Category::NoLight => 1,
            Category::VisibleLight => 2,
            Category::Infrared => 3,
            Category::Unknown(code) => code,
        }
    }

    /// Name used in saved artifact file names.
    pub fn file_name(self) -> Cow<'static, str> {
        match self {
            Category::NoLight => Cow::Borrowed("No_Light"),
            Category::VisibleLight => Cow::Borrowed("Visible_Light"),
            Category::Infrared => Cow::Borrowed("Infrared_Light"),
            Category::Unknown(code) => Cow::Owned(format!("Type{code}")),
        }
    }

    /// Human-readable label used in logs and reports.
    pub fn label(self) -> Cow<'static, str> {
        match self {
            Category::NoLight => Cow::Borrowed("No Light"),
            Category::VisibleLight => Cow::Borrowed("Visible Light"),
            Category::Infrared => Cow::Borrowed("Infrared Light"),
            Category::Unknown(code) => Cow::Owned(format!("unknown mode {code}")),
        }
    }
}

impl From<u32> for Category {
    fn from(code: u32) -> Self {
        Category::from_code(code)
    }
}

impl From<Category> for u32 {
    fn from(category: Category) -> Self {
        category.code()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
