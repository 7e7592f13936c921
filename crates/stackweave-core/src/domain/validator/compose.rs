//! Just enough of the compose file model to cross-check it.
//!
//! Only the keys the validator reads are modelled; everything else is
//! ignored on deserialization. Both the short and long syntax of each key are
//! accepted.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: BTreeMap<String, Service>,

    /// Top-level named volume registry.
    #[serde(default)]
    pub volumes: Option<BTreeMap<String, Option<serde_yaml::Value>>>,
}

impl ComposeFile {
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn declares_volume(&self, name: &str) -> bool {
        self.volumes
            .as_ref()
            .is_some_and(|volumes| volumes.contains_key(name))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub build: Option<serde_yaml::Value>,

    #[serde(default)]
    pub depends_on: Option<DependsOn>,

    #[serde(default)]
    pub ports: Vec<PortEntry>,

    #[serde(default)]
    pub volumes: Vec<VolumeEntry>,
}

impl Service {
    pub fn dependencies(&self) -> Vec<&str> {
        match &self.depends_on {
            Some(DependsOn::List(names)) => names.iter().map(String::as_str).collect(),
            Some(DependsOn::Map(map)) => map.keys().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Named volumes mounted by this service (bind mounts excluded).
    pub fn named_volumes(&self) -> Vec<&str> {
        self.volumes
            .iter()
            .filter_map(VolumeEntry::named_source)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PortEntry {
    Number(u32),
    Short(String),
    Long {
        target: u32,
        #[serde(default)]
        published: Option<serde_yaml::Value>,
        #[serde(default)]
        host_ip: Option<String>,
    },
}

/// A resolved port mapping. `published` is `None` when the port is only
/// exposed to other services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: Option<String>,
    pub published: Option<String>,
    pub target: String,
}

impl PortEntry {
    pub fn mapping(&self) -> PortMapping {
        match self {
            Self::Number(n) => PortMapping {
                host_ip: None,
                published: None,
                target: n.to_string(),
            },
            Self::Short(s) => {
                let s = s.split('/').next().unwrap_or_default();
                let parts: Vec<&str> = s.rsplitn(3, ':').collect();
                match parts.as_slice() {
                    [target] => PortMapping {
                        host_ip: None,
                        published: None,
                        target: (*target).to_string(),
                    },
                    [target, published] => PortMapping {
                        host_ip: None,
                        published: Some((*published).to_string()),
                        target: (*target).to_string(),
                    },
                    [target, published, ip, ..] => PortMapping {
                        host_ip: Some((*ip).to_string()),
                        published: Some((*published).to_string()),
                        target: (*target).to_string(),
                    },
                    [] => PortMapping {
                        host_ip: None,
                        published: None,
                        target: String::new(),
                    },
                }
            }
            Self::Long {
                target,
                published,
                host_ip,
            } => PortMapping {
                host_ip: host_ip.clone(),
                published: published.as_ref().and_then(yaml_scalar),
                target: target.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VolumeEntry {
    Short(String),
    Long {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        source: Option<String>,
    },
}

impl VolumeEntry {
    fn named_source(&self) -> Option<&str> {
        match self {
            Self::Short(s) => {
                let (source, _) = s.split_once(':')?;
                is_volume_name(source).then_some(source)
            }
            Self::Long { kind, source } => {
                let source = source.as_deref()?;
                let is_volume = kind.as_deref().is_none_or(|k| k == "volume");
                (is_volume && is_volume_name(source)).then_some(source)
            }
        }
    }
}

fn is_volume_name(source: &str) -> bool {
    !source.is_empty() && !source.starts_with(['.', '/', '~', '$']) && !source.contains('/')
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
