//! Publisher and subscriber rendering options

use std::fmt;
use std::str::FromStr;

/// How the SDK inserts its video element relative to the target placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    Replace,
    After,
    Before,
    #[default]
    Append,
}

impl InsertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertMode::Replace => "replace",
            InsertMode::After => "after",
            InsertMode::Before => "before",
            InsertMode::Append => "append",
        }
    }
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(InsertMode::Replace),
            "after" => Ok(InsertMode::After),
            "before" => Ok(InsertMode::Before),
            "append" => Ok(InsertMode::Append),
            other => Err(format!("unknown insert mode '{other}'")),
        }
    }
}

/// Options handed to `initPublisher` and `subscribe`. Dimensions are kept as
/// CSS-like strings (`"100%"`, `"640px"`) since rendering belongs to the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaOptions {
    pub insert_mode: InsertMode,
    pub width: String,
    pub height: String,
}

impl Default for MediaOptions {
    fn default() -> Self {
        MediaOptions {
            insert_mode: InsertMode::Append,
            width: "100%".to_string(),
            height: "100%".to_string(),
        }
    }
}
