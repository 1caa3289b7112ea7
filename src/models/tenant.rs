use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const DEFAULT_COMPANY_NAME: &str = "our practice";
const DEFAULT_AGENT_NAME: &str = "your assistant";

/// Per-tenant configuration supplied with each turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    #[serde(alias = "companyName")]
    pub company_name: Option<String>,
    #[serde(alias = "agentName")]
    pub agent_name: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub locations: Vec<Location>,
    #[serde(deserialize_with = "lenient_list")]
    pub services: Vec<NamedEntry>,
    #[serde(alias = "insuranceProviders", deserialize_with = "lenient_list")]
    pub insurance_providers: Vec<NamedEntry>,
    /// Secondary data source, consulted when the explicit lists are empty.
    #[serde(alias = "demoData")]
    pub profile: Option<TenantProfile>,
}

impl TenantConfig {
    pub fn company_name(&self) -> &str {
        non_blank(self.company_name.as_deref())
            .or_else(|| self.profile.as_ref().and_then(|p| non_blank(p.company_name.as_deref())))
            .unwrap_or(DEFAULT_COMPANY_NAME)
    }

    pub fn agent_name(&self) -> &str {
        non_blank(self.agent_name.as_deref())
            .or_else(|| self.profile.as_ref().and_then(|p| non_blank(p.agent_name.as_deref())))
            .unwrap_or(DEFAULT_AGENT_NAME)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantProfile {
    #[serde(alias = "companyName")]
    pub company_name: Option<String>,
    #[serde(alias = "agentName")]
    pub agent_name: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub locations: Vec<Location>,
    #[serde(alias = "demo_services", deserialize_with = "lenient_list")]
    pub services: Vec<NamedEntry>,
    #[serde(alias = "insuranceProviders", deserialize_with = "lenient_list")]
    pub insurance_providers: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    /// Lines shaped like `"Monday: 9:00 AM – 5:00 PM"`.
    #[serde(deserialize_with = "lenient_list")]
    pub hours: Vec<String>,
    pub opening_hours: Option<OpeningHours>,
}

impl Location {
    pub fn label(&self) -> Option<&str> {
        non_blank(self.name.as_deref()).or_else(|| non_blank(self.city.as_deref()))
    }

    pub fn hour_lines(&self) -> &[String] {
        if !self.hours.is_empty() {
            return &self.hours;
        }
        self.opening_hours
            .as_ref()
            .map(|o| o.weekday_text.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    #[serde(deserialize_with = "lenient_list")]
    pub weekday_text: Vec<String>,
}

/// Services and insurers arrive either as bare strings or as objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedEntry {
    Plain(String),
    Detailed(EntryDetail),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDetail {
    #[serde(alias = "title", alias = "service_name", alias = "serviceName")]
    pub name: Option<String>,
}

impl NamedEntry {
    pub fn label(&self) -> Option<&str> {
        match self {
            NamedEntry::Plain(s) => non_blank(Some(s.as_str())),
            NamedEntry::Detailed(d) => non_blank(d.name.as_deref()),
        }
    }
}

/// Tenant lists come from loosely shaped upstream data. `null` reads as an
/// empty list, a lone value as a list of one, and items of the wrong shape
/// are skipped so one bad entry doesn't cost the rest of the config.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
