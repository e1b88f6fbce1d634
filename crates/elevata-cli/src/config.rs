//! Environment-driven configuration, the same `clap::Args` + `env = "..."`
//! pattern `crates/migrate/src/lib.rs` uses for `DATABASE_URL`/`DATABASE_CA`.

use elevata_types::Dialect;

/// Process-wide configuration resolved once from the environment (spec §6).
#[derive(Debug, clap::Args)]
pub struct Config {
    /// Name of the active profile; selects which `SEC_<PROFILE>_PEPPER` to read.
    #[arg(long = "profile", env = "ELEVATA_PROFILE", default_value = "dev")]
    pub profile: String,

    /// Directory holding per-profile override files, if the deployment splits them out.
    #[arg(long = "profiles-path", env = "ELEVATA_PROFILES_PATH")]
    pub profiles_path: Option<String>,

    /// Default SQL dialect when `--dialect` is not given on the command line.
    #[arg(long = "default-dialect", env = "ELEVATA_SQL_DIALECT")]
    pub default_dialect: Option<Dialect>,

    /// Alias some deployments use instead of `ELEVATA_SQL_DIALECT`.
    #[arg(long = "dialect-alias", env = "ELEVATA_DIALECT", hide = true)]
    pub dialect_alias: Option<Dialect>,

    #[arg(long = "meta-schema", env = "ELEVATA_META_SCHEMA_NAME", default_value = "meta")]
    pub meta_schema: String,

    #[arg(long = "auto-provision-schemas", env = "ELEVATA_AUTO_PROVISION_SCHEMAS", default_value_t = true)]
    pub auto_provision_schemas: bool,

    #[arg(long = "auto-provision-tables", env = "ELEVATA_AUTO_PROVISION_TABLES", default_value_t = true)]
    pub auto_provision_tables: bool,

    #[arg(long = "auto-provision-meta-log", env = "ELEVATA_AUTO_PROVISION_META_LOG", default_value_t = true)]
    pub auto_provision_meta_log: bool,

    /// Pepper used by `COL(__pepper__)` surrogate-key components, resolved
    /// once per run and never persisted. Falls back to `SEC_<PROFILE>_PEPPER`
    /// (see [`Config::pepper`]) when this is unset.
    #[arg(long = "pepper", env = "ELEVATA_PEPPER", hide_env_values = true)]
    pub pepper: Option<String>,

    #[arg(long = "gcp-project", env = "GOOGLE_CLOUD_PROJECT")]
    pub gcp_project: Option<String>,

    #[arg(long = "gcloud-project", env = "GCLOUD_PROJECT", hide = true)]
    pub gcloud_project: Option<String>,

    #[arg(long = "bigquery-location", env = "GOOGLE_BIGQUERY_LOCATION")]
    pub bigquery_location: Option<String>,

    /// Path to a JSON-serialized `CatalogSnapshot`, the bridge to the
    /// metadata store (an external collaborator per spec §3/§4.5).
    #[arg(long = "catalog-path", env = "ELEVATA_CATALOG_PATH")]
    pub catalog_path: String,

    /// Postgres connection string, used when the resolved engine backend
    /// needs a live connection (only `Dialect::Postgres` is wired to a real
    /// engine in this implementation; see `engine::postgres`).
    #[arg(long = "database-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl Config {
    /// The effective `ELEVATA_PEPPER`, falling back to `SEC_<PROFILE>_PEPPER`.
    pub fn pepper(&self) -> Option<String> {
        self.pepper.clone().or_else(|| {
            let key = format!("SEC_{}_PEPPER", self.profile.to_uppercase());
            std::env::var(key).ok()
        })
    }

    /// `--dialect`/`ELEVATA_SQL_DIALECT` resolution order: explicit CLI flag,
    /// then `ELEVATA_SQL_DIALECT`, then the `ELEVATA_DIALECT` alias.
    pub fn resolve_dialect(&self, explicit: Option<Dialect>) -> Option<Dialect> {
        explicit.or(self.default_dialect).or(self.dialect_alias)
    }

    pub fn effective_gcp_project(&self) -> Option<String> {
        self.gcp_project.clone().or_else(|| self.gcloud_project.clone())
    }
}

/// A resolved per-environment profile: the effective dialect/meta-schema/
/// auto-provision set for this run, the way `migrate::MigrateArgs` resolves
/// `--src-data-plane`/`--tgt-data-plane` into one working configuration.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub dialect: Dialect,
    pub meta_schema: String,
    pub auto_provision_schemas: bool,
    pub auto_provision_tables: bool,
    pub auto_provision_meta_log: bool,
}

impl Profile {
    pub fn resolve(config: &Config, explicit_dialect: Option<Dialect>) -> anyhow::Result<Self> {
        let dialect = config
            .resolve_dialect(explicit_dialect)
            .ok_or_else(|| anyhow::anyhow!("no SQL dialect resolved: pass --dialect or set ELEVATA_SQL_DIALECT"))?;
        Ok(Self {
            name: config.profile.clone(),
            dialect,
            meta_schema: config.meta_schema.clone(),
            auto_provision_schemas: config.auto_provision_schemas,
            auto_provision_tables: config.auto_provision_tables,
            auto_provision_meta_log: config.auto_provision_meta_log,
        })
    }
}
