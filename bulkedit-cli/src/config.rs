//! Configuration file loading for bulkedit.
//!
//! Discovers and loads `bulkedit.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::{Context, bail};
use bulkedit_types::ids::ProductId;
use bulkedit_types::query::{DEFAULT_PAGE_SIZE, QueryFilters, QueryHints};
use bulkedit_types::spec::CorrectionSpec;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "bulkedit.toml";

/// Top-level configuration from bulkedit.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BulkeditConfig {
    /// Catalog query settings.
    pub query: QueryConfig,

    /// Correction list, applied in order.
    pub corrections: Vec<CorrectionConfig>,

    pub output: OutputConfig,
}

/// Query section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Product status to match; `any` matches every status.
    pub status: Option<String>,

    pub page_size: Option<u32>,

    pub offset: Option<u64>,

    /// Pass-through `field = value` filters.
    pub filters: BTreeMap<String, String>,

    /// Catalog caching hints. Hint keys given as filters take precedence.
    pub hints: QueryHints,
}

/// One `[[corrections]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionConfig {
    pub attribute: String,
    pub from: String,
    pub to: String,
}

impl From<&CorrectionConfig> for CorrectionSpec {
    fn from(c: &CorrectionConfig) -> Self {
        CorrectionSpec::new(&c.attribute, &c.from, &c.to)
    }
}

/// Output section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for report artifacts.
    pub dir: Option<Utf8PathBuf>,
}

/// Discover the bulkedit.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a bulkedit.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<BulkeditConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<BulkeditConfig> {
    let config: BulkeditConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return default if not found.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<BulkeditConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(BulkeditConfig::default()),
    }
}

/// Run arguments that override the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub status: Option<String>,
    pub page_size: Option<u32>,
    pub offset: Option<u64>,
    pub filters: BTreeMap<String, String>,
    pub renames: Vec<CorrectionSpec>,
    pub out_dir: Option<Utf8PathBuf>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
    pub filters: QueryFilters,

    /// Config corrections followed by CLI renames.
    pub specs: Vec<CorrectionSpec>,

    pub out_dir: Option<Utf8PathBuf>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: BulkeditConfig,
}

impl ConfigMerger {
    pub fn new(config: BulkeditConfig) -> Self {
        Self { config }
    }

    /// Merge with run command CLI arguments.
    ///
    /// Scalars from the CLI win. CLI filters extend the config filters and replace entries
    /// with the same key.
    pub fn merge_run_args(self, cli: RunOverrides) -> MergedConfig {
        let query = &self.config.query;

        let mut filters = query.filters.clone();
        filters.extend(cli.filters);

        let specs = self.merge_specs(&cli.renames);

        MergedConfig {
            filters: QueryFilters {
                status: cli.status.or_else(|| query.status.clone()),
                page_size: cli.page_size.or(query.page_size).unwrap_or(DEFAULT_PAGE_SIZE),
                offset: cli.offset.or(query.offset).unwrap_or(0),
                filters,
                hints: query.hints.clone(),
                ..Default::default()
            },
            specs,
            out_dir: cli.out_dir.or_else(|| self.config.output.dir.clone()),
        }
    }

    /// Config corrections followed by CLI renames.
    pub fn merge_specs(&self, cli_renames: &[CorrectionSpec]) -> Vec<CorrectionSpec> {
        self.config
            .corrections
            .iter()
            .map(CorrectionSpec::from)
            .chain(cli_renames.iter().cloned())
            .collect()
    }
}

/// Parse CLI filters from key=value strings.
pub fn parse_cli_filters(filters: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for entry in filters {
        let mut parts = entry.splitn(2, '=');
        let key = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid filter '{}': missing key", entry))?;
        let value = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid filter '{}': missing value", entry))?;
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

/// Parse a `attribute:old=new` rename.
pub fn parse_rename(raw: &str) -> anyhow::Result<CorrectionSpec> {
    let Some((attribute, values)) = raw.split_once(':') else {
        bail!("invalid rename '{}': expected attribute:old=new", raw);
    };
    let Some((old, new)) = values.split_once('=') else {
        bail!("invalid rename '{}': expected attribute:old=new", raw);
    };
    Ok(CorrectionSpec::new(attribute.trim(), old.trim(), new.trim()))
}

/// Parse positional product ids. Each argument may hold a comma-separated list.
pub fn parse_target_ids(args: &[String]) -> anyhow::Result<Vec<ProductId>> {
    let mut ids = Vec::new();
    for arg in args {
        for part in arg.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id: u64 = part
                .parse()
                .with_context(|| format!("invalid product id '{}'", part))?;
            ids.push(ProductId(id));
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[query]
status = "publish"
page_size = 100
offset = 20

[query.filters]
pa_size = "xl"

[[corrections]]
attribute = "color"
from = "red"
to = "crimson"

[[corrections]]
attribute = "pa_size"
from = "xl"
to = "x-large"

[output]
dir = "out/bulkedit"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.query.status.as_deref(), Some("publish"));
        assert_eq!(config.query.page_size, Some(100));
        assert_eq!(config.query.offset, Some(20));
        assert_eq!(config.query.filters.get("pa_size"), Some(&"xl".to_string()));
        assert_eq!(config.corrections.len(), 2);
        assert_eq!(config.corrections[1].to, "x-large");
        assert_eq!(config.output.dir, Some(Utf8PathBuf::from("out/bulkedit")));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.corrections.is_empty());
        assert!(config.query.filters.is_empty());
        assert!(config.output.dir.is_none());
    }

    #[test]
    fn test_parse_correction_missing_field() {
        let contents = r#"
[[corrections]]
attribute = "color"
from = "red"
"#;
        let err = parse_config(contents).expect_err("missing to");
        assert!(format!("{:#}", err).contains("missing field `to`"));
    }

    #[test]
    fn test_merge_defaults() {
        let merged =
            ConfigMerger::new(BulkeditConfig::default()).merge_run_args(RunOverrides::default());
        assert_eq!(merged.filters, QueryFilters::default());
        assert!(merged.specs.is_empty());
        assert!(merged.out_dir.is_none());
    }

    #[test]
    fn test_merge_cli_overrides_scalars_and_extends_filters() {
        let config = parse_config(
            r#"
[query]
status = "draft"
page_size = 50
offset = 5

[query.filters]
pa_size = "xl"
pa_fit = "slim"

[output]
dir = "from-config"
"#,
        )
        .unwrap();

        let cli = RunOverrides {
            status: Some("publish".into()),
            page_size: Some(10),
            offset: None,
            filters: BTreeMap::from([("pa_size".to_string(), "m".to_string())]),
            renames: vec![],
            out_dir: Some("from-cli".into()),
        };
        let merged = ConfigMerger::new(config).merge_run_args(cli);

        assert_eq!(merged.filters.status.as_deref(), Some("publish"));
        assert_eq!(merged.filters.page_size, 10);
        assert_eq!(merged.filters.offset, 5);
        assert_eq!(merged.filters.filters.get("pa_size"), Some(&"m".to_string()));
        assert_eq!(merged.filters.filters.get("pa_fit"), Some(&"slim".to_string()));
        assert_eq!(merged.out_dir, Some(Utf8PathBuf::from("from-cli")));
    }

    #[test]
    fn test_query_hints_table_reaches_filters() {
        let config = parse_config(
            r#"
[query.hints]
cache_terms = true
count_found_rows = true
"#,
        )
        .unwrap();

        let merged = ConfigMerger::new(config).merge_run_args(RunOverrides {
            filters: parse_cli_filters(&["update_post_meta_cache=1".to_string()])
                .expect("parse filters"),
            ..Default::default()
        });

        assert_eq!(
            merged.filters.hints,
            QueryHints {
                cache_terms: true,
                cache_meta: false,
                ignore_sticky: true,
                count_found_rows: true,
            }
        );

        // Hint filters pass through the merge untouched; the sweep folds them in.
        let mut filters = merged.filters.clone();
        filters.extract_hints().expect("hints");
        assert!(filters.hints.cache_meta);
        assert!(filters.filters.is_empty());
    }

    #[test]
    fn test_merge_specs_appends_cli_renames() {
        let config = parse_config(
            r#"
[[corrections]]
attribute = "color"
from = "red"
to = "crimson"
"#,
        )
        .unwrap();

        let specs = ConfigMerger::new(config)
            .merge_specs(&[CorrectionSpec::new("size", "xl", "x-large")]);
        assert_eq!(
            specs,
            vec![
                CorrectionSpec::new("color", "red", "crimson"),
                CorrectionSpec::new("size", "xl", "x-large"),
            ]
        );
    }

    #[test]
    fn test_parse_cli_filters() {
        let parsed =
            parse_cli_filters(&["pa_size=xl".to_string(), " pa_fit = slim ".to_string()])
                .expect("parse filters");
        assert_eq!(parsed.get("pa_size"), Some(&"xl".to_string()));
        assert_eq!(parsed.get("pa_fit"), Some(&"slim".to_string()));

        let err = parse_cli_filters(&["=xl".to_string()]).expect_err("missing key");
        assert!(err.to_string().contains("missing key"));
        let err = parse_cli_filters(&["pa_size".to_string()]).expect_err("missing value");
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn test_parse_rename() {
        assert_eq!(
            parse_rename("color:red=crimson").expect("rename"),
            CorrectionSpec::new("color", "red", "crimson")
        );
        // Values may contain the separators after the first occurrence.
        assert_eq!(
            parse_rename("ratio:1:2=1=2").expect("rename"),
            CorrectionSpec::new("ratio", "1:2", "1=2")
        );
        assert!(parse_rename("color=red").is_err());
        assert!(parse_rename("color:red").is_err());
    }

    #[test]
    fn test_parse_target_ids_accepts_commas() {
        let ids = parse_target_ids(&["12,13".to_string(), "14".to_string(), "15,".to_string()])
            .expect("ids");
        assert_eq!(
            ids,
            vec![ProductId(12), ProductId(13), ProductId(14), ProductId(15)]
        );

        let err = parse_target_ids(&["12,abc".to_string()]).expect_err("bad id");
        assert!(err.to_string().contains("invalid product id 'abc'"));
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());
        assert!(load_or_default(&root).expect("default").corrections.is_empty());

        std::fs::write(root.join(CONFIG_FILE_NAME), "[output]\ndir = \"x\"\n")
            .expect("write config");
        assert!(discover_config(&root).is_some());
        let cfg = load_or_default(&root).expect("load");
        assert_eq!(cfg.output.dir, Some(Utf8PathBuf::from("x")));
    }
}
