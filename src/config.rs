use std::{fs, net::SocketAddr, path::Path};

use serde::Deserialize;
use tracing::info;

/// The resolved configuration. Built once at startup and never mutated
/// afterwards, so it's shared between requests as an `Arc<Config>`.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub site: SiteConfig,
    pub opensearch: OpenSearchConfig,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// The name of the host application, used as the fallback short name.
    pub name: String,
    /// Prefix for every route, for when we're served from a subpath.
    pub subdirectory: String,
    /// Scheme used for absolute urls when the request doesn't tell us one
    /// with `X-Forwarded-Proto`.
    pub scheme: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenSearchConfig {
    pub description: String,
    pub short_name: String,
    /// Url template containing a literal `{searchTerms}`. Relative templates
    /// are made absolute with the origin of the request, so they're resolved
    /// from the host root and not from `site.subdirectory`. The same goes for
    /// `suggestions_url` and the favicon path.
    pub search_url: String,
    pub suggestions_url: String,
    pub contact_email: String,
    pub favicon: Option<Favicon>,
    pub input_encoding: String,
    pub output_encoding: String,
    /// Where the description document is served, below `site.subdirectory`.
    /// Always starts with a `/`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Favicon {
    pub path: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl OpenSearchConfig {
    /// Look up a setting by the name host applications know it by, like
    /// `OPENSEARCH_DESCRIPTION`. The favicon keys are `None` when no favicon
    /// is configured.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "OPENSEARCH_DESCRIPTION" => self.description.clone(),
            "OPENSEARCH_SHORT_NAME" => self.short_name.clone(),
            "OPENSEARCH_SEARCH_URL" => self.search_url.clone(),
            "OPENSEARCH_SUGGESTIONS_URL" => self.suggestions_url.clone(),
            "OPENSEARCH_CONTACT_EMAIL" => self.contact_email.clone(),
            "OPENSEARCH_FAVICON_PATH" => self.favicon.as_ref()?.path.clone(),
            "OPENSEARCH_FAVICON_TYPE" => self.favicon.as_ref()?.mime_type.clone(),
            "OPENSEARCH_FAVICON_WIDTH" => self.favicon.as_ref()?.width.to_string(),
            "OPENSEARCH_FAVICON_HEIGHT" => self.favicon.as_ref()?.height.to_string(),
            "OPENSEARCH_INPUT_ENCODING" => self.input_encoding.clone(),
            "OPENSEARCH_OUTPUT_ENCODING" => self.output_encoding.clone(),
            "OPENSEARCH_PATH" => self.path.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// The config as it appears in a toml file, where everything is optional.
#[derive(Deserialize, Debug, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    #[serde(default)]
    pub site: PartialSiteConfig,
    #[serde(default)]
    pub opensearch: PartialOpenSearchConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialSiteConfig {
    pub name: Option<String>,
    pub subdirectory: Option<String>,
    pub scheme: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialOpenSearchConfig {
    pub description: Option<String>,
    pub short_name: Option<String>,
    pub search_url: Option<String>,
    pub suggestions_url: Option<String>,
    pub contact_email: Option<String>,
    pub favicon_path: Option<String>,
    pub favicon_type: Option<String>,
    pub favicon_width: Option<u32>,
    pub favicon_height: Option<u32>,
    pub input_encoding: Option<String>,
    pub output_encoding: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn read_or_create(config_path: &Path) -> eyre::Result<Self> {
        let mut config = PartialConfig::base()?;

        if !config_path.exists() {
            info!("No config found, creating one at {config_path:?}");
            let default_config_str = include_str!("../config-default.toml");
            fs::write(config_path, default_config_str)?;
        }

        let given_config = toml::from_str::<PartialConfig>(&fs::read_to_string(config_path)?)?;
        config.update(given_config);
        Ok(config.resolve())
    }

    /// Resolve a config from a toml string, with config-base.toml filling in
    /// whatever it leaves out.
    pub fn from_toml(config_str: &str) -> eyre::Result<Self> {
        let mut config = PartialConfig::base()?;
        config.update(toml::from_str(config_str)?);
        Ok(config.resolve())
    }
}

impl PartialConfig {
    pub fn base() -> eyre::Result<Self> {
        let base_config_str = include_str!("../config-base.toml");
        Ok(toml::from_str(base_config_str)?)
    }

    // Update the current config with the given config. Anything the new
    // config leaves unset keeps its current value, which is how
    // config-base.toml ends up as the fallback for every key.
    pub fn update(&mut self, new: PartialConfig) {
        self.bind = new.bind.or(self.bind);

        let site = &mut self.site;
        site.name = new.site.name.or(site.name.take());
        site.subdirectory = new.site.subdirectory.or(site.subdirectory.take());
        site.scheme = new.site.scheme.or(site.scheme.take());

        let os = &mut self.opensearch;
        let new_os = new.opensearch;
        os.description = new_os.description.or(os.description.take());
        os.short_name = new_os.short_name.or(os.short_name.take());
        os.search_url = new_os.search_url.or(os.search_url.take());
        os.suggestions_url = new_os.suggestions_url.or(os.suggestions_url.take());
        os.contact_email = new_os.contact_email.or(os.contact_email.take());
        os.favicon_path = new_os.favicon_path.or(os.favicon_path.take());
        os.favicon_type = new_os.favicon_type.or(os.favicon_type.take());
        os.favicon_width = new_os.favicon_width.or(os.favicon_width);
        os.favicon_height = new_os.favicon_height.or(os.favicon_height);
        os.input_encoding = new_os.input_encoding.or(os.input_encoding.take());
        os.output_encoding = new_os.output_encoding.or(os.output_encoding.take());
        os.path = new_os.path.or(os.path.take());
    }

    /// Fill in anything that's still missing. Nothing here is validated, a
    /// missing description is just an empty one.
    pub fn resolve(self) -> Config {
        let subdirectory = self.site.subdirectory.unwrap_or_default();
        let subdirectory = subdirectory.trim_matches('/');
        let site = SiteConfig {
            name: self.site.name.unwrap_or_default(),
            subdirectory: if subdirectory.is_empty() {
                String::new()
            } else {
                format!("/{subdirectory}")
            },
            scheme: self.site.scheme.unwrap_or_else(|| "https".to_string()),
        };

        let os = self.opensearch;
        let favicon = match os.favicon_path {
            Some(path) if !path.is_empty() => Some(Favicon {
                path,
                mime_type: os.favicon_type.unwrap_or_default(),
                width: os.favicon_width.unwrap_or(16),
                height: os.favicon_height.unwrap_or(16),
            }),
            _ => None,
        };

        let opensearch = OpenSearchConfig {
            description: os.description.unwrap_or_default(),
            short_name: os.short_name.unwrap_or_else(|| site.name.clone()),
            search_url: os.search_url.unwrap_or_default(),
            suggestions_url: os.suggestions_url.unwrap_or_default(),
            contact_email: os.contact_email.unwrap_or_default(),
            favicon,
            input_encoding: os.input_encoding.unwrap_or_else(|| "UTF-8".to_string()),
            output_encoding: os.output_encoding.unwrap_or_else(|| "UTF-8".to_string()),
            path: match os.path {
                Some(path) if path.starts_with('/') => path,
                Some(path) => format!("/{path}"),
                None => "/opensearch.xml".to_string(),
            },
        };

        Config {
            bind: self
                .bind
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 28019))),
            site,
            opensearch,
        }
    }
}
