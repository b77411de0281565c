use {
    crate::kernel::entities::Address,
    anyhow::{
        bail,
        Result,
    },
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs,
        time::Duration,
    },
};

mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the market server service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    #[command(flatten)]
    pub config: ConfigOptions,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file with the chain gateway and auction settings
    #[arg(long = "config")]
    #[arg(env = "MARKET_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub chain:   ChainConfig,
    #[serde(default)]
    pub auction: AuctionConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        Self::from_yaml(&yaml_content)
    }

    pub fn from_yaml(yaml_content: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(yaml_content)?;
        if config.auction.expiration_sweep_interval.is_zero() {
            bail!("auction.expiration_sweep_interval must be greater than zero");
        }
        Ok(config)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChainConfig {
    /// URL of the chain gateway JSON-RPC endpoint.
    pub rpc_addr:        String,
    /// Address of the market contract auctions are settled on.
    pub market_contract: Address,
    /// Timeout for a single chain submission.
    #[serde(with = "humantime_serde", default = "ChainConfig::default_rpc_timeout")]
    pub rpc_timeout:     Duration,
}

impl ChainConfig {
    fn default_rpc_timeout() -> Duration {
        Duration::from_secs(10)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuctionConfig {
    /// How often auctions past their end time are concluded.
    #[serde(
        with = "humantime_serde",
        default = "AuctionConfig::default_expiration_sweep_interval"
    )]
    pub expiration_sweep_interval: Duration,
}

impl AuctionConfig {
    fn default_expiration_sweep_interval() -> Duration {
        Duration::from_secs(60)
    }
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            expiration_sweep_interval: Self::default_expiration_sweep_interval(),
        }
    }
}
