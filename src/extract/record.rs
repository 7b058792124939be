use serde::{Deserialize, Serialize};

/// A normalized job posting extracted from one detail page
///
/// Optional fields are `None` when the page did not provide them; they are never
/// empty strings. Serialized with the camelCase field names consumers expect
/// (`jobId`, `applyUrl`, `baseSalary`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,

    /// Unique id of the job on the crawled site, taken from the detail URL
    pub job_id: String,

    /// The listing page the job was discovered from
    pub url: String,

    pub company: String,

    /// City, region and country where available
    pub location: String,

    pub description: String,

    /// Address users are sent to; unlike `url` it needs no session cookie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_hours: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_sector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}
