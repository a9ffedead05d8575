use crate::output::{MediaFilter, SaveMode, SinkConfig};
use crate::session::Credential;
use crate::task::descriptor::{TaskDescriptor, TaskKind};
use crate::task::filters::{
    DistanceFilter, GeoPoint, NoteRange, NoteTypeFilter, RecencyWindow, SearchFilters, SortOrder,
};
use crate::url::{parse_note_ref, parse_user_ref};
use crate::{ConfigError, ConfigResult, CookieError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// Result count used when a search request does not name one
pub const DEFAULT_REQUIRE_NUM: u32 = 10;

/// Task request as sent by the host
///
/// ```json
/// {
///   "cookie": "a1=...; web_session=...",
///   "taskType": "search",
///   "params": {"query": "咖啡", "requireNum": 20, "sortType": 1},
///   "saveOptions": {"mode": "all", "excelName": "coffee"},
///   "paths": {"media": "./media", "excel": "./excel"},
///   "proxy": "http://127.0.0.1:7890"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub cookie: String,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub save_options: Option<SaveOptions>,
    #[serde(default)]
    pub paths: OutputPaths,
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Output selection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    pub mode: String,
    #[serde(default)]
    pub excel_name: Option<String>,
}

/// Output directories
#[derive(Debug, Clone, Deserialize)]
pub struct OutputPaths {
    #[serde(default = "default_media_dir")]
    pub media: PathBuf,
    #[serde(default = "default_excel_dir")]
    pub excel: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            media: default_media_dir(),
            excel: default_excel_dir(),
        }
    }
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("datas/media_datas")
}

fn default_excel_dir() -> PathBuf {
    PathBuf::from("datas/excel_datas")
}

#[derive(Deserialize)]
struct NotesParams {
    notes: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserParams {
    #[serde(default)]
    user_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default = "default_require_num")]
    require_num: u32,
    #[serde(default)]
    sort_type: u8,
    #[serde(default)]
    note_type: u8,
    #[serde(default)]
    note_time: u8,
    #[serde(default)]
    note_range: u8,
    #[serde(default)]
    pos_distance: u8,
    #[serde(default)]
    geo: Option<GeoPoint>,
}

fn default_require_num() -> u32 {
    DEFAULT_REQUIRE_NUM
}

impl TaskRequest {
    /// Parses a request from its JSON text
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn task_kind(&self) -> ConfigResult<TaskKind> {
        self.task_type.parse()
    }

    /// Parses the session cookie
    pub fn credential(&self) -> Result<Credential, CookieError> {
        Credential::parse(&self.cookie)
    }

    /// Proxy URL, ignoring blank values
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Validates the parameters and builds the task descriptor
    pub fn descriptor(&self) -> ConfigResult<TaskDescriptor> {
        match self.task_kind()? {
            TaskKind::Notes => {
                let params: NotesParams = self.params_as()?;
                let notes = params
                    .notes
                    .ok_or_else(|| ConfigError::MissingParameter("notes".to_string()))?;
                let refs = notes
                    .iter()
                    .map(|raw| {
                        parse_note_ref(raw).map_err(|e| ConfigError::InvalidParameter {
                            name: "notes".to_string(),
                            message: e.to_string(),
                        })
                    })
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok(TaskDescriptor::FixedNotes(refs))
            }
            TaskKind::User => {
                let params: UserParams = self.params_as()?;
                if params.user_url.trim().is_empty() {
                    return Err(ConfigError::MissingParameter("userUrl".to_string()));
                }
                let user =
                    parse_user_ref(&params.user_url).map_err(|e| ConfigError::InvalidParameter {
                        name: "userUrl".to_string(),
                        message: e.to_string(),
                    })?;
                Ok(TaskDescriptor::UserTimeline(user))
            }
            TaskKind::Search => {
                let params: SearchParams = self.params_as()?;
                let query = params.query.trim();
                if query.is_empty() {
                    return Err(ConfigError::MissingParameter("query".to_string()));
                }
                let filters = SearchFilters {
                    sort: filter_code("sortType", params.sort_type, SortOrder::from_code)?,
                    note_type: filter_code("noteType", params.note_type, NoteTypeFilter::from_code)?,
                    recency: filter_code("noteTime", params.note_time, RecencyWindow::from_code)?,
                    range: filter_code("noteRange", params.note_range, NoteRange::from_code)?,
                    distance: filter_code(
                        "posDistance",
                        params.pos_distance,
                        DistanceFilter::from_code,
                    )?,
                    geo: params.geo,
                    require_num: params.require_num,
                };
                Ok(TaskDescriptor::KeywordSearch {
                    query: query.to_string(),
                    filters,
                })
            }
        }
    }

    /// Builds the sink configuration from `saveOptions` and `paths`
    pub fn sink_config(&self) -> ConfigResult<SinkConfig> {
        let options = self
            .save_options
            .as_ref()
            .ok_or_else(|| ConfigError::MissingParameter("saveOptions".to_string()))?;

        let (mode, media_filter) =
            parse_save_mode(&options.mode).ok_or_else(|| ConfigError::InvalidParameter {
                name: "saveOptions.mode".to_string(),
                message: format!("unknown save mode '{}'", options.mode),
            })?;

        let table_name = match options.excel_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.default_table_name()?,
        };

        Ok(SinkConfig {
            mode,
            media_filter,
            media_dir: self.paths.media.clone(),
            tabular_dir: self.paths.excel.clone(),
            table_name,
        })
    }

    fn default_table_name(&self) -> ConfigResult<String> {
        Ok(match self.task_kind()? {
            TaskKind::Notes => "笔记数据".to_string(),
            TaskKind::User => "用户笔记".to_string(),
            TaskKind::Search => {
                let params: SearchParams = self.params_as()?;
                format!("{}_搜索结果", params.query.trim())
            }
        })
    }

    fn params_as<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        let params = match &self.params {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| ConfigError::InvalidParameter {
            name: "params".to_string(),
            message: e.to_string(),
        })
    }
}

/// Maps a host save mode onto sink selection
fn parse_save_mode(raw: &str) -> Option<(SaveMode, MediaFilter)> {
    match raw {
        "all" => Some((SaveMode::Both, MediaFilter::All)),
        "excel" => Some((SaveMode::TabularOnly, MediaFilter::All)),
        "media" => Some((SaveMode::MediaOnly, MediaFilter::All)),
        "media-video" => Some((SaveMode::MediaOnly, MediaFilter::VideoOnly)),
        "media-image" => Some((SaveMode::MediaOnly, MediaFilter::ImageOnly)),
        "none" => Some((SaveMode::None, MediaFilter::All)),
        _ => None,
    }
}

fn filter_code<T>(name: &str, code: u8, parse: fn(u8) -> Option<T>) -> ConfigResult<T> {
    parse(code).ok_or_else(|| ConfigError::InvalidParameter {
        name: name.to_string(),
        message: format!("unsupported code {}", code),
    })
}
