use countdown::StrategyKind;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level, overridden by `RUST_LOG` when set
    pub log_level: String,

    /// The strategies started when none are given on the command line
    pub strategies: Vec<StrategyKind>,

    /// Countdown library configuration
    #[serde(flatten)]
    pub countdown: countdown::config::Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            strategies: StrategyKind::ALL.to_vec(),
            countdown: countdown::config::Config::default(),
        }
    }
}

pub fn load(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    } else {
        // Optional default config file in current directory
        builder = builder.add_source(
            config::File::from(std::path::Path::new("countdown-demo.toml")).required(false),
        );
    }

    // Allow environment variables to override
    builder = builder.add_source(
        config::Environment::with_prefix("COUNTDOWN_DEMO")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("strategies"),
    );

    builder.build()?.try_deserialize().map_err(Into::into)
}
